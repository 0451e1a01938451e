use crate::Error;
use std::{fmt, str::FromStr};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Model {
    Modnet,
    Rmbg14,
    Rmbg14Fp16,
    Rmbg14Quantized,
    U2NET,
    U2NETP,
}

impl Model {
    pub fn all_models() -> Vec<Self> {
        vec![
            Self::Modnet,
            Self::Rmbg14,
            Self::Rmbg14Fp16,
            Self::Rmbg14Quantized,
            Self::U2NET,
            Self::U2NETP,
        ]
    }

    pub fn to_input_size(&self) -> (u32, u32) {
        match self {
            Model::Modnet => (512, 512),
            Model::Rmbg14 | Model::Rmbg14Fp16 | Model::Rmbg14Quantized => (1024, 1024),
            Model::U2NET | Model::U2NETP => (320, 320),
        }
    }

    /// Per-channel `(mean, std)` applied to `pixel / 255` before inference.
    pub fn normalization(&self) -> ([f32; 3], [f32; 3]) {
        match self {
            Self::Modnet => ([0.5; 3], [0.5; 3]),
            Self::Rmbg14 | Self::Rmbg14Fp16 | Self::Rmbg14Quantized => ([0.5; 3], [1.0; 3]),
            Self::U2NET | Self::U2NETP => ([0.485, 0.456, 0.406], [0.229, 0.224, 0.225]),
        }
    }

    // U2Net predictions are min-max stretched to the full mask range
    pub fn stretches_output(&self) -> bool {
        matches!(self, Self::U2NET | Self::U2NETP)
    }

    pub fn file_name(&self) -> &'static str {
        match self {
            Self::Modnet => "modnet_photographic_portrait_matting.onnx",
            Self::Rmbg14 => "rmbg-1.4.onnx",
            Self::Rmbg14Fp16 => "rmbg-1.4_fp16.onnx",
            Self::Rmbg14Quantized => "rmbg-1.4_quantized.onnx",
            Self::U2NET => "u2net.onnx",
            Self::U2NETP => "u2netp.onnx",
        }
    }

    pub fn download_url(&self) -> &'static str {
        match self {
            Self::Modnet => {
                "https://huggingface.co/TheEeeeLin/HivisionIDPhotos_matting/resolve/034769305faf641ad94edfac654aba13be06e816/modnet_photographic_portrait_matting.onnx"
            }
            Self::Rmbg14 => "https://huggingface.co/briaai/RMBG-1.4/resolve/main/onnx/model.onnx",
            Self::Rmbg14Fp16 => {
                "https://huggingface.co/briaai/RMBG-1.4/resolve/main/onnx/model_fp16.onnx"
            }
            Self::Rmbg14Quantized => {
                "https://huggingface.co/briaai/RMBG-1.4/resolve/main/onnx/model_quantized.onnx"
            }
            Self::U2NET => "https://huggingface.co/AlenZeng/u2netonnxmodel/resolve/main/u2net.onnx",
            Self::U2NETP => {
                "https://huggingface.co/martintomov/comfy/resolve/1b0c3477e152d8a2dea8e4e418a6dba32de56fda/rembg/u2netp.onnx"
            }
        }
    }
}

impl fmt::Display for Model {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.file_name())
    }
}

impl FromStr for Model {
    type Err = Error;

    /// Accepts the model file name, with or without the `.onnx` suffix.
    fn from_str(name: &str) -> Result<Self, Self::Err> {
        let name = name.trim();
        let stem = name.strip_suffix(".onnx").unwrap_or(name);

        Self::all_models()
            .into_iter()
            .find(|model| model.file_name().trim_end_matches(".onnx") == stem)
            .ok_or_else(|| Error::UnknownModel(name.to_string()))
    }
}
