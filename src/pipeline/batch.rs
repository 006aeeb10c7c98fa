use std::num::NonZeroUsize;
use std::time::Duration;

use tracing::debug;

/// 処理対象を固定長バッチに分け、バッチ間で待機する。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct BatchScheduler {
    batch_size: Option<NonZeroUsize>,
    batch_delay: Duration,
}

impl BatchScheduler {
    #[must_use]
    pub fn new(batch_size: Option<NonZeroUsize>, batch_delay: Duration) -> Self {
        Self {
            batch_size,
            batch_delay,
        }
    }

    /// 連続したバッチに分割する。最後のバッチ以外は `batch_size` ちょうど。
    ///
    /// バッチサイズ未指定、または対象数以上なら1バッチにまとめる。
    #[must_use]
    pub fn plan<'a>(&self, indices: &'a [usize]) -> Vec<&'a [usize]> {
        if indices.is_empty() {
            return Vec::new();
        }
        match self.batch_size {
            Some(size) if size.get() < indices.len() => indices.chunks(size.get()).collect(),
            _ => vec![indices],
        }
    }

    /// バッチ間の待機。遅延が0なら何もしない。
    pub async fn pause(&self) {
        if self.batch_delay.is_zero() {
            return;
        }
        debug!(
            delay_secs = self.batch_delay.as_secs_f64(),
            "waiting before next batch"
        );
        tokio::time::sleep(self.batch_delay).await;
    }
}
