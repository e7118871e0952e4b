use std::path::Path;
use std::process::{Command, Stdio};

/// GPU vendors with a hardware H.264 encoder, in probing priority order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AcceleratorVendor {
    Nvidia,
    Amd,
    Intel,
}

impl AcceleratorVendor {
    /// Probing order: the first vendor present wins.
    pub const PRIORITY: [AcceleratorVendor; 3] = [Self::Nvidia, Self::Amd, Self::Intel];

    /// PCI vendor id as exposed under `/sys/class/drm/*/device/vendor`.
    pub fn pci_id(self) -> u16 {
        match self {
            Self::Nvidia => 0x10de,
            Self::Amd => 0x1002,
            Self::Intel => 0x8086,
        }
    }

    pub fn from_pci_id(id: u16) -> Option<Self> {
        Self::PRIORITY.into_iter().find(|v| v.pci_id() == id)
    }

    /// ffmpeg encoder identifier for this vendor.
    pub fn encoder(self) -> &'static str {
        match self {
            Self::Nvidia => "h264_nvenc",
            Self::Amd => "h264_amf",
            Self::Intel => "h264_qsv",
        }
    }

    fn defaults(self) -> (&'static str, RateControl) {
        match self {
            Self::Nvidia => ("p5", RateControl::ConstantQuality(21)),
            Self::Amd => ("quality", RateControl::ConstantQp(21)),
            Self::Intel => ("medium", RateControl::GlobalQuality(21)),
        }
    }
}

/// Quality control of an encoder invocation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case", tag = "mode", content = "value")]
pub enum RateControl {
    /// x264-style constant rate factor.
    Crf(u8),
    /// NVENC variable bitrate with a constant quality target.
    ConstantQuality(u8),
    /// AMF constant QP for I and P frames.
    ConstantQp(u8),
    /// QSV ICQ quality.
    GlobalQuality(u8),
}

impl RateControl {
    pub fn to_args(self) -> Vec<String> {
        match self {
            Self::Crf(v) => vec!["-crf".into(), v.to_string()],
            Self::ConstantQuality(v) => vec!["-rc".into(), "vbr".into(), "-cq".into(), v.to_string()],
            Self::ConstantQp(v) => vec![
                "-rc".into(),
                "cqp".into(),
                "-qp_i".into(),
                v.to_string(),
                "-qp_p".into(),
                v.to_string(),
            ],
            Self::GlobalQuality(v) => vec!["-global_quality".into(), v.to_string()],
        }
    }
}

/// Encoder chosen once at session start.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct EncoderRecommendation {
    pub encoder: String,
    pub preset: String,
    pub rate_control: RateControl,
    pub accelerated: bool,
    pub vendor: Option<AcceleratorVendor>,
}

impl EncoderRecommendation {
    /// `libx264` with the given quality and preset.
    pub fn software(crf: u8, preset: &str) -> Self {
        Self {
            encoder: "libx264".to_string(),
            preset: preset.to_string(),
            rate_control: RateControl::Crf(crf),
            accelerated: false,
            vendor: None,
        }
    }

    pub fn hardware(vendor: AcceleratorVendor) -> Self {
        let (preset, rate_control) = vendor.defaults();
        Self {
            encoder: vendor.encoder().to_string(),
            preset: preset.to_string(),
            rate_control,
            accelerated: true,
            vendor: Some(vendor),
        }
    }

    /// ffmpeg output arguments selecting this encoder.
    pub fn codec_args(&self) -> Vec<String> {
        let mut args = vec![
            "-c:v".to_string(),
            self.encoder.clone(),
            "-preset".to_string(),
            self.preset.clone(),
        ];
        args.extend(self.rate_control.to_args());
        args.extend(["-pix_fmt".to_string(), "yuv420p".to_string()]);
        args
    }
}

/// Where capability information comes from.
pub trait CapabilitySource {
    /// Accelerators present on this machine, in any order.
    fn accelerators(&self) -> Vec<AcceleratorVendor>;
    /// Encoder identifiers the encoding toolchain was built with.
    fn encoders(&self) -> Vec<String>;
}

/// Reads the local machine: DRM sysfs, `nvidia-smi` and `ffmpeg -encoders`.
#[derive(Clone, Copy, Debug, Default)]
pub struct SystemCapabilities;

impl CapabilitySource for SystemCapabilities {
    fn accelerators(&self) -> Vec<AcceleratorVendor> {
        let mut found = drm_vendors(Path::new("/sys/class/drm"));
        if !found.contains(&AcceleratorVendor::Nvidia) && command_succeeds("nvidia-smi", &["-L"]) {
            found.push(AcceleratorVendor::Nvidia);
        }
        found
    }

    fn encoders(&self) -> Vec<String> {
        match Command::new("ffmpeg")
            .args(["-hide_banner", "-encoders"])
            .stdin(Stdio::null())
            .stderr(Stdio::null())
            .output()
        {
            Ok(out) if out.status.success() => parse_encoder_list(&String::from_utf8_lossy(&out.stdout)),
            Ok(out) => {
                tracing::debug!(status = %out.status, "ffmpeg -encoders failed");
                Vec::new()
            }
            Err(err) => {
                tracing::debug!(error = %err, "ffmpeg not runnable");
                Vec::new()
            }
        }
    }
}

fn drm_vendors(root: &Path) -> Vec<AcceleratorVendor> {
    let Ok(entries) = std::fs::read_dir(root) else {
        return Vec::new();
    };
    let mut found = Vec::new();
    for entry in entries.flatten() {
        let vendor_file = entry.path().join("device").join("vendor");
        let Ok(raw) = std::fs::read_to_string(&vendor_file) else {
            continue;
        };
        let id = u16::from_str_radix(raw.trim().trim_start_matches("0x"), 16).ok();
        if let Some(vendor) = id.and_then(AcceleratorVendor::from_pci_id)
            && !found.contains(&vendor)
        {
            found.push(vendor);
        }
    }
    found
}

fn command_succeeds(program: &str, args: &[&str]) -> bool {
    Command::new(program)
        .args(args)
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .map(|s| s.success())
        .unwrap_or(false)
}

/// Encoder names from `ffmpeg -encoders` output.
pub fn parse_encoder_list(output: &str) -> Vec<String> {
    output
        .lines()
        .skip_while(|l| !l.trim_start().starts_with("------"))
        .skip(1)
        .filter_map(|l| {
            let mut parts = l.split_whitespace();
            let flags = parts.next()?;
            let name = parts.next()?;
            flags.starts_with('V').then(|| name.to_string())
        })
        .collect()
}

/// Intersects detected accelerators with available encoders.
#[derive(Clone, Debug, Default)]
pub struct HardwareCapabilityProbe<S = SystemCapabilities> {
    source: S,
}

impl<S: CapabilitySource> HardwareCapabilityProbe<S> {
    pub fn new(source: S) -> Self {
        Self { source }
    }

    /// First vendor in [`AcceleratorVendor::PRIORITY`] that is both present and supported by the
    /// toolchain, else software encoding with `crf`/`preset`.
    pub fn recommend(&self, crf: u8, preset: &str) -> EncoderRecommendation {
        let accelerators = self.source.accelerators();
        let encoders = self.source.encoders();
        tracing::debug!(?accelerators, encoders = encoders.len(), "probed encoding capabilities");

        let chosen = AcceleratorVendor::PRIORITY
            .into_iter()
            .filter(|v| accelerators.contains(v))
            .find(|v| encoders.iter().any(|e| e == v.encoder()));
        let rec = match chosen {
            Some(vendor) => EncoderRecommendation::hardware(vendor),
            None => EncoderRecommendation::software(crf, preset),
        };
        tracing::info!(encoder = %rec.encoder, accelerated = rec.accelerated, "encoder recommendation");
        rec
    }
}

#[cfg(test)]
#[path = "../../tests/unit/encode/probe.rs"]
mod tests;
