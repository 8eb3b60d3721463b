//! Loop processing lifecycle
//!
//! Drives an uploaded loop through PENDING → PROCESSING → READY/FAILED:
//! flip to PROCESSING, transcode the preview, probe the true duration and
//! extract the waveform envelope, then record everything in one terminal
//! write. Every job ends in a terminal status and the queue message is
//! acknowledged in both outcomes, so a permanently broken file is never
//! redelivered forever.
//!
//! Reprocessing is safe: deterministic inputs produce deterministic
//! outputs, so redelivery of an already-READY loop just recomputes
//! identical artifacts.

use std::time::Duration;

use loopcast_queue::{EventType, NotificationEvent, ProcessingJob, QueueClient, QueueName};
use loopcast_shared_config::StorageConfig;
use serde_json::json;

use crate::error::{WorkerError, WorkerResult};
use crate::jobs::probe::probe_duration;
use crate::jobs::transcode::{preview_relative_path, transcode_preview};
use crate::jobs::waveform::extract_envelope;
use crate::repository::LoopStore;

/// Everything a processing job needs
#[derive(Clone)]
pub struct ProcessContext {
    pub store: LoopStore,
    pub queue: QueueClient,
    pub storage: StorageConfig,
    pub job_timeout: Duration,
}

/// Entry point for one processing-queue delivery
///
/// A malformed payload is an error (the message is nacked without requeue
/// by the consumer). A pipeline failure is not: the loop is marked FAILED
/// and `Ok` is returned so the message is acknowledged.
pub async fn handle_message(ctx: &ProcessContext, payload: Vec<u8>) -> WorkerResult<()> {
    let job: ProcessingJob = serde_json::from_slice(&payload)
        .map_err(|e| WorkerError::InvalidJobData(e.to_string()))?;

    if let Err(e) = run_pipeline(ctx, &job).await {
        e.log();
        ctx.store.mark_failed(job.resource_id).await?;
        tracing::warn!(loop_id = %job.resource_id, "Loop marked failed");
    }

    Ok(())
}

async fn run_pipeline(ctx: &ProcessContext, job: &ProcessingJob) -> WorkerResult<()> {
    tracing::info!(
        loop_id = %job.resource_id,
        source = %job.source_file_path,
        job_type = ?job.job_type,
        "Processing loop"
    );

    // Visible immediately so clients polling the status see activity
    ctx.store.mark_processing(job.resource_id).await?;

    let input = ctx.storage.resolve(&job.source_file_path);
    tokio::fs::create_dir_all(ctx.storage.previews_dir()).await?;

    let preview_rel = preview_relative_path(job.resource_id);
    let preview_abs = ctx.storage.resolve(&preview_rel);

    // Encoder failure is fatal to the job
    transcode_preview(&input, &preview_abs, ctx.job_timeout).await?;

    // Probe and waveform degrade on failure instead of aborting; the
    // original file is read-only so the two can run concurrently
    let (duration, waveform) = tokio::join!(
        probe_duration(&input, ctx.job_timeout),
        extract_envelope(&input, ctx.job_timeout),
    );

    if let Some(secs) = duration {
        tracing::debug!(loop_id = %job.resource_id, duration_secs = secs, "Probed duration");
    }

    let processed = ctx
        .store
        .finish_processing(job.resource_id, &preview_rel, &waveform, duration)
        .await?;

    match processed {
        Some(owner) => {
            // Fire-and-forget: losing this event must not fail the job
            let event = NotificationEvent::new(
                EventType::ProcessingComplete,
                owner.user_id,
                json!({
                    "loopId": job.resource_id,
                    "loopTitle": owner.title,
                }),
            );
            if let Err(e) = ctx.queue.publish(QueueName::Notifications, &event).await {
                tracing::warn!(
                    loop_id = %job.resource_id,
                    error = %e,
                    "Failed to publish processing-complete event"
                );
            }
            tracing::info!(loop_id = %job.resource_id, "Loop processed");
        }
        None => {
            tracing::warn!(loop_id = %job.resource_id, "Loop row vanished during processing");
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    #[test]
    fn test_malformed_payload_is_a_handler_error() {
        let payload = b"{ not json".to_vec();
        let parsed: Result<ProcessingJob, _> = serde_json::from_slice(&payload);
        assert!(parsed.is_err());
    }

    #[test]
    fn test_job_payload_round_trips_through_handler_parse() {
        let job = ProcessingJob::transcode(Uuid::new_v4(), "originals/take-1.wav");
        let payload = serde_json::to_vec(&job).unwrap();
        let parsed: ProcessingJob = serde_json::from_slice(&payload).unwrap();
        assert_eq!(parsed, job);
    }
}
