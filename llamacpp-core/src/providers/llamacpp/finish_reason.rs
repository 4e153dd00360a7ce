//! Stop-tag to finish reason mapping

use crate::protocol::{FinishReason, FinishReasonKind};

/// Map a llama.cpp `stop_type` to a unified finish reason.
///
/// Total over every input; the raw tag is kept whenever one was reported.
pub fn map_finish_reason(stop_type: Option<&str>) -> FinishReason {
    let Some(tag) = stop_type else {
        return FinishReason::unknown();
    };

    let unified = match tag {
        "eos" | "word" => FinishReasonKind::Stop,
        "limit" => FinishReasonKind::Length,
        _ => FinishReasonKind::Other,
    };

    FinishReason {
        unified,
        raw: Some(tag.to_string()),
    }
}
