use serde::{Deserialize, Serialize};
use std::fmt;

/// 硬體加速方案：決定 ffmpeg 使用的視訊編碼器與裝置參數
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EncoderProfile {
    /// CPU 軟體編碼（libx264），所有平台可用
    Software,
    /// Apple VideoToolbox 硬體編碼
    VideoToolbox,
    /// NVIDIA NVENC
    Nvenc,
    /// Intel Quick Sync
    QuickSync,
    /// AMD AMF
    Amf,
}

impl Default for EncoderProfile {
    fn default() -> Self {
        Self::Software
    }
}

impl EncoderProfile {
    /// 方案對應的 ffmpeg 視訊編碼器名稱
    #[must_use]
    pub const fn codec(self) -> &'static str {
        match self {
            Self::Software => "libx264",
            Self::VideoToolbox => "h264_videotoolbox",
            Self::Nvenc => "h264_nvenc",
            Self::QuickSync => "h264_qsv",
            Self::Amf => "h264_amf",
        }
    }

    /// 需要指定裝置編號的方案對應的參數名稱
    #[must_use]
    pub const fn device_flag(self) -> Option<&'static str> {
        match self {
            Self::Nvenc => Some("-gpu"),
            Self::QuickSync => Some("-qsv_device"),
            Self::Software | Self::VideoToolbox | Self::Amf => None,
        }
    }

    /// 目前平台可選的方案
    #[must_use]
    pub fn platform_options() -> &'static [Self] {
        if cfg!(target_os = "macos") {
            &[Self::Software, Self::VideoToolbox]
        } else {
            &[Self::Software, Self::Nvenc, Self::QuickSync, Self::Amf]
        }
    }
}

impl fmt::Display for EncoderProfile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Software => "CPU",
            Self::VideoToolbox => "Apple 加速",
            Self::Nvenc => "NVIDIA 顯卡",
            Self::QuickSync => "Intel 顯卡",
            Self::Amf => "AMD 顯卡",
        };
        write!(f, "{name}")
    }
}
