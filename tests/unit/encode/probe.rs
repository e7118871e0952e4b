use super::*;

struct Fixed {
    accelerators: Vec<AcceleratorVendor>,
    encoders: Vec<&'static str>,
}

impl CapabilitySource for Fixed {
    fn accelerators(&self) -> Vec<AcceleratorVendor> {
        self.accelerators.clone()
    }

    fn encoders(&self) -> Vec<String> {
        self.encoders.iter().map(|s| s.to_string()).collect()
    }
}

fn probe(accelerators: Vec<AcceleratorVendor>, encoders: Vec<&'static str>) -> EncoderRecommendation {
    HardwareCapabilityProbe::new(Fixed {
        accelerators,
        encoders,
    })
    .recommend(18, "medium")
}

#[test]
fn no_accelerator_recommends_software() {
    let rec = probe(vec![], vec!["libx264", "h264_nvenc", "h264_qsv"]);
    assert!(!rec.accelerated);
    assert_eq!(rec.encoder, "libx264");
    assert_eq!(rec.rate_control, RateControl::Crf(18));
    assert_eq!(rec.vendor, None);
}

#[test]
fn accelerator_without_encoder_falls_back_to_software() {
    let rec = probe(vec![AcceleratorVendor::Nvidia], vec!["libx264"]);
    assert!(!rec.accelerated);
}

#[test]
fn vendor_priority_is_nvidia_amd_intel() {
    let all = vec!["libx264", "h264_nvenc", "h264_amf", "h264_qsv"];
    let rec = probe(
        vec![AcceleratorVendor::Intel, AcceleratorVendor::Amd, AcceleratorVendor::Nvidia],
        all.clone(),
    );
    assert_eq!(rec.vendor, Some(AcceleratorVendor::Nvidia));
    assert!(rec.accelerated);

    let rec = probe(vec![AcceleratorVendor::Intel, AcceleratorVendor::Amd], all.clone());
    assert_eq!(rec.encoder, "h264_amf");

    // present but unsupported by the toolchain: skip to the next vendor
    let rec = probe(
        vec![AcceleratorVendor::Amd, AcceleratorVendor::Intel],
        vec!["libx264", "h264_qsv"],
    );
    assert_eq!(rec.encoder, "h264_qsv");
}

#[test]
fn parses_ffmpeg_encoder_listing() {
    let listing = "Encoders:
 V..... = Video
 A..... = Audio
 ------
 V....D libx264              libx264 H.264 / AVC / MPEG-4 AVC
 V....D h264_nvenc           NVIDIA NVENC H.264 encoder
 A....D aac                  AAC (Advanced Audio Coding)
";
    assert_eq!(parse_encoder_list(listing), vec!["libx264", "h264_nvenc"]);
    assert!(parse_encoder_list("garbage").is_empty());
}

#[test]
fn codec_args_include_rate_control() {
    let args = EncoderRecommendation::software(20, "fast").codec_args();
    assert_eq!(
        args,
        vec!["-c:v", "libx264", "-preset", "fast", "-crf", "20", "-pix_fmt", "yuv420p"]
    );
    let nv = EncoderRecommendation::hardware(AcceleratorVendor::Nvidia).codec_args();
    assert!(nv.windows(2).any(|w| w == ["-cq", "21"]));
}

#[test]
fn pci_ids_round_trip_to_vendors() {
    for v in AcceleratorVendor::PRIORITY {
        assert_eq!(AcceleratorVendor::from_pci_id(v.pci_id()), Some(v));
    }
    assert_eq!(AcceleratorVendor::from_pci_id(0x1234), None);
}
