use std::{
    env,
    net::{IpAddr, Ipv4Addr, SocketAddr},
    path::PathBuf,
};

#[cfg(feature = "tch-backend")]
use anyhow::Context;
#[cfg(feature = "tch-backend")]
use tch::Device;

const DEFAULT_MAX_UPLOAD_BYTES: usize = 16 * 1024 * 1024;

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub listen_addr: SocketAddr,
    pub model_path: PathBuf,
    pub max_upload_bytes: usize,
    #[cfg(feature = "tch-backend")]
    pub device: Device,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let listen_addr = env::var("SERVER_ADDR")
            .unwrap_or_else(|_| "0.0.0.0:5000".into())
            .parse()
            .unwrap_or_else(|_| SocketAddr::new(IpAddr::V4(Ipv4Addr::UNSPECIFIED), 5000));

        let model_path = PathBuf::from(
            env::var("MODEL_PATH")
                .unwrap_or_else(|_| "models/colorization_generator.pt".to_string()),
        );

        let max_upload_bytes = env::var("MAX_UPLOAD_BYTES")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(DEFAULT_MAX_UPLOAD_BYTES);

        #[cfg(feature = "tch-backend")]
        let device = {
            let raw = env::var("DEVICE").unwrap_or_else(|_| "cpu".into());
            parse_device(&raw)?
        };

        Ok(Self {
            listen_addr,
            model_path,
            max_upload_bytes,
            #[cfg(feature = "tch-backend")]
            device,
        })
    }
}

/// Accepts `cpu`, `cuda` or `cuda:N`. A CUDA ordinal the machine does not
/// have degrades to the CPU with a warning; anything else is rejected.
#[cfg(feature = "tch-backend")]
pub fn parse_device(raw: &str) -> anyhow::Result<Device> {
    let spec = raw.trim().to_ascii_lowercase();
    let ordinal = match spec.as_str() {
        "cpu" => return Ok(Device::Cpu),
        "cuda" => 0,
        other => match other.strip_prefix("cuda:") {
            Some(idx) => idx
                .parse::<usize>()
                .with_context(|| format!("invalid CUDA ordinal in device `{raw}`"))?,
            None => anyhow::bail!("unsupported device `{raw}`, expected cpu, cuda or cuda:N"),
        },
    };

    let available = usize::try_from(tch::Cuda::device_count()).unwrap_or(0);
    if ordinal < available {
        Ok(Device::Cuda(ordinal))
    } else {
        tracing::warn!(requested = %raw, available, "CUDA device not present, using CPU");
        Ok(Device::Cpu)
    }
}
