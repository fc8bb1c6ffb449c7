use crate::transport::TransportResult;
use crate::worker::Worker;

/// 响应体无法反序列化
pub const DESERIALIZE_ERROR: &str = "Can't deserialize answer.";
/// 响应体反序列化为空结果
pub const UNKNOWN_ERROR: &str = "Unknown Error";

/// 把传输结果交给 worker，恰好触发 `execute` 或 `error_processing` 之一
///
/// 400 视为业务错误，优先把响应体作为错误信息；
/// 其他失败状态使用传输层的错误文本。
pub fn resolve<W: Worker>(result: &TransportResult, worker: &mut W) {
    if let Some(error) = result.error.as_deref().filter(|error| !error.is_empty()) {
        let message = if result.status == 400 && !result.body.is_empty() {
            result.body_text().into_owned()
        } else {
            error.to_string()
        };
        log::debug!("{} failed with {}: {}", result.url, result.status, message);
        worker.error_processing(result.status, message);
        return;
    }

    #[cfg(debug_assertions)]
    log::debug!("{} answered {}: {}", result.url, result.status, result.body_text());

    match worker.deserialize(&result.body) {
        Ok(Some(response)) => worker.execute(response),
        Ok(None) => worker.error_processing(result.status, UNKNOWN_ERROR.to_string()),
        Err(e) => {
            log::warn!("Response from {} not understood: {:#}", result.url, e);
            worker.error_processing(400, DESERIALIZE_ERROR.to_string());
        }
    }
}
