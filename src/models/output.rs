use crate::utils::error::ClassifyError;
use crate::Result;
use ndarray::ArrayD;
use serde::Serialize;

/// 模型输出到风险概率的约定
///
/// 无法从模型本身推断，部署时必须显式指定。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, clap::ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum OutputConvention {
    /// 单一输出，直接为风险概率
    Probability,
    /// 单一 logit，经 sigmoid 得到概率
    SigmoidLogit,
    /// 两个 logit [健康, 风险]，softmax 后取风险类
    SoftmaxRisk,
    /// 单一输出为健康概率，风险 = 1 - 输出
    Complement,
}

impl OutputConvention {
    pub fn as_str(&self) -> &'static str {
        match self {
            OutputConvention::Probability => "probability",
            OutputConvention::SigmoidLogit => "sigmoid-logit",
            OutputConvention::SoftmaxRisk => "softmax-risk",
            OutputConvention::Complement => "complement",
        }
    }

    /// 该约定要求的输出元素数量
    pub fn expected_len(&self) -> usize {
        match self {
            OutputConvention::SoftmaxRisk => 2,
            _ => 1,
        }
    }

    /// 从原始输出中提取风险分数（未截断）
    pub fn extract(&self, output: &ArrayD<f32>) -> Result<f32> {
        if output.len() != self.expected_len() {
            return Err(ClassifyError::Inference(format!(
                "Output convention '{}' expects {} value(s), model returned shape {:?}",
                self.as_str(),
                self.expected_len(),
                output.shape()
            )));
        }

        let values: Vec<f32> = output.iter().copied().collect();
        let score = match self {
            OutputConvention::Probability => values[0],
            OutputConvention::SigmoidLogit => sigmoid(values[0]),
            OutputConvention::SoftmaxRisk => softmax_pair(values[0], values[1]),
            OutputConvention::Complement => 1.0 - values[0],
        };

        if !score.is_finite() {
            return Err(ClassifyError::Inference(format!(
                "Model produced a non-finite score ({}) from {:?}",
                score, values
            )));
        }

        Ok(score)
    }
}

fn sigmoid(x: f32) -> f32 {
    1.0 / (1.0 + (-x).exp())
}

/// 两类 softmax 中第二类的概率
fn softmax_pair(healthy: f32, risky: f32) -> f32 {
    // 减去最大值避免溢出
    let max = healthy.max(risky);
    let e_healthy = (healthy - max).exp();
    let e_risky = (risky - max).exp();
    e_risky / (e_healthy + e_risky)
}
