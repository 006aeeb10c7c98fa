/// 分類サービス呼び出しのエラー分類。
use anyhow::Error;

use crate::domain::categorization::FailureKind;

/// サービス呼び出しのエラーをレコード単位の失敗種別に振り分ける。
///
/// HTTPクライアント側のタイムアウトは `TimedOut`、それ以外はすべて `ServiceError`。
#[must_use]
pub(crate) fn classify_service_error(error: &Error) -> FailureKind {
    let timed_out = error.chain().any(|cause| {
        cause
            .downcast_ref::<reqwest::Error>()
            .is_some_and(reqwest::Error::is_timeout)
            || cause.downcast_ref::<tokio::time::error::Elapsed>().is_some()
    });

    if timed_out {
        FailureKind::TimedOut
    } else {
        FailureKind::ServiceError
    }
}
