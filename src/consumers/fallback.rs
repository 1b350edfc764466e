use crate::domain::model::{Delivery, ReadyFile};
use crate::domain::ports::Consumer;
use crate::utils::error::{HarnessError, Result};

/// 依序嘗試多個 consumer 的後備鏈：第一個成功的就算交付完成，
/// 每一層的失敗都記錄後吞掉，全部失敗才回報 `DeliveryError`
#[derive(Default)]
pub struct FallbackChain {
    layers: Vec<Box<dyn Consumer>>,
}

impl FallbackChain {
    pub fn new() -> Self {
        Self { layers: Vec::new() }
    }

    pub fn push(mut self, consumer: impl Consumer + 'static) -> Self {
        self.layers.push(Box::new(consumer));
        self
    }

    pub fn len(&self) -> usize {
        self.layers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.layers.is_empty()
    }

    pub fn layer_names(&self) -> Vec<&str> {
        self.layers.iter().map(|l| l.name()).collect()
    }
}

#[async_trait::async_trait]
impl Consumer for FallbackChain {
    fn name(&self) -> &str {
        "fallback-chain"
    }

    async fn deliver(&self, file: &ReadyFile) -> Result<Delivery> {
        for (index, layer) in self.layers.iter().enumerate() {
            match layer.deliver(file).await {
                Ok(delivery) => {
                    if index > 0 {
                        tracing::info!(
                            "✅ Fallback layer '{}' handled {} after {} failed layer(s)",
                            layer.name(),
                            file.path.display(),
                            index
                        );
                    }
                    return Ok(delivery);
                }
                Err(e) => {
                    // 吞掉，換下一層
                    tracing::warn!(
                        "⚠️ Consumer '{}' failed for {}: {}",
                        layer.name(),
                        file.path.display(),
                        e
                    );
                }
            }
        }

        Err(HarnessError::DeliveryError {
            path: file.path.display().to_string(),
        })
    }
}
