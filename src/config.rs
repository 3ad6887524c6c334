use crate::classify::ThresholdPreset;
use crate::image::{Normalization, PreprocessConfig, ResizePolicy, TensorLayout};
use crate::models::OutputConvention;
use crate::utils::error::ClassifyError;
use crate::Result;
use serde::Serialize;
use std::net::SocketAddr;
use std::path::PathBuf;

/// 默认模型路径
pub const DEFAULT_MODEL_PATH: &str = "models/model.onnx";

#[derive(Debug, Clone)]
pub struct Config {
    /// 服务器绑定地址
    pub bind_addr: String,

    /// 模型文件路径
    pub model_path: PathBuf,

    /// 工作线程数量
    pub workers: usize,

    /// 开发模式
    pub dev_mode: bool,

    /// ONNX Runtime配置
    pub onnx_config: OnnxConfig,

    /// 服务器配置
    pub server_config: ServerConfig,

    /// 分类器配置（预处理 + 输出约定）
    pub classifier: ClassifierConfig,

    /// Web表单使用的阈值预设
    pub form_preset: ThresholdPreset,

    /// 仪表盘使用的阈值预设
    pub dashboard_preset: ThresholdPreset,
}

#[derive(Debug, Clone)]
pub struct OnnxConfig {
    /// CPU线程数
    pub intra_threads: usize,

    /// 优化级别
    pub optimization_level: i32,
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// 请求超时时间（秒）
    pub request_timeout: u64,

    /// 最大请求体大小（字节）
    pub max_request_size: usize,
}

/// 模型相关的分类配置，必须与训练时保持一致
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ClassifierConfig {
    pub preprocess: PreprocessConfig,
    pub output: OutputConvention,
}

impl ClassifierConfig {
    pub fn new(preprocess: PreprocessConfig, output: OutputConvention) -> Self {
        Self { preprocess, output }
    }
}

/// 原始三个前端各自的默认组合
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, clap::ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum ShellProfile {
    WebForm,
    Dashboard,
    Desktop,
}

impl ShellProfile {
    pub fn preprocess(&self) -> PreprocessConfig {
        match self {
            ShellProfile::WebForm => PreprocessConfig {
                resize: ResizePolicy::Direct,
                normalization: Normalization::Imagenet,
                layout: TensorLayout::Nchw,
            },
            ShellProfile::Dashboard => PreprocessConfig {
                resize: ResizePolicy::Direct,
                normalization: Normalization::UnitScale,
                layout: TensorLayout::Nhwc,
            },
            ShellProfile::Desktop => PreprocessConfig {
                resize: ResizePolicy::ResizeThenCrop,
                normalization: Normalization::Imagenet,
                layout: TensorLayout::Nchw,
            },
        }
    }

    pub fn threshold_preset(&self) -> ThresholdPreset {
        match self {
            ShellProfile::WebForm => ThresholdPreset::Binary,
            ShellProfile::Dashboard => ThresholdPreset::SafeRisky,
            ShellProfile::Desktop => ThresholdPreset::FourLevel,
        }
    }
}

impl Config {
    pub fn new(
        bind_addr: String,
        model_path: impl Into<PathBuf>,
        workers: Option<usize>,
        dev_mode: bool,
        classifier: ClassifierConfig,
    ) -> Result<Self> {
        bind_addr.parse::<SocketAddr>().map_err(|e| {
            ClassifyError::Config(format!("Invalid bind address {}: {}", bind_addr, e))
        })?;

        let cpu_cores = num_cpus::get();
        let workers = workers.unwrap_or(cpu_cores);
        if workers == 0 {
            return Err(ClassifyError::Config("workers must be at least 1".to_string()));
        }

        Ok(Self {
            bind_addr,
            model_path: model_path.into(),
            workers,
            dev_mode,
            onnx_config: OnnxConfig::for_cores(cpu_cores),
            server_config: ServerConfig::new(dev_mode),
            classifier,
            form_preset: ThresholdPreset::Binary,
            dashboard_preset: ThresholdPreset::SafeRisky,
        })
    }

    /// 覆盖各前端的阈值预设
    pub fn with_presets(mut self, form: ThresholdPreset, dashboard: ThresholdPreset) -> Self {
        self.form_preset = form;
        self.dashboard_preset = dashboard;
        self
    }
}

impl OnnxConfig {
    pub fn for_cores(cpu_cores: usize) -> Self {
        Self {
            intra_threads: (cpu_cores * 3 / 4).max(1), // 使用75%的CPU核心
            optimization_level: 3,
        }
    }
}

impl Default for OnnxConfig {
    fn default() -> Self {
        Self::for_cores(num_cpus::get())
    }
}

impl ServerConfig {
    pub fn new(dev_mode: bool) -> Self {
        Self {
            request_timeout: if dev_mode { 300 } else { 60 }, // 开发模式更长超时
            max_request_size: 50 * 1024 * 1024,               // 50MB
        }
    }
}
