//! Submit a signed transaction and converge on a terminal status.

use std::time::Duration;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::backoff::ExponentialBackoff;
use crate::config::DriverConfig;
use crate::error::{LifecycleError, SubmissionError};
use crate::ports::{RpcEndpoint, ScalarDecoder};
use crate::types::{StatusRecord, SubmissionHandle, SubmissionRequest};

/// Drives a submission through submit → poll → terminal status.
///
/// Holds no per-handle state, so a single driver can confirm many
/// transactions concurrently.
pub struct TransactionLifecycleDriver<E> {
    endpoint: E,
    config: DriverConfig,
}

impl<E: RpcEndpoint> TransactionLifecycleDriver<E> {
    pub fn new(endpoint: E, config: DriverConfig) -> Self {
        Self { endpoint, config }
    }

    pub fn endpoint(&self) -> &E {
        &self.endpoint
    }

    pub fn config(&self) -> &DriverConfig {
        &self.config
    }

    /// Hand a signed payload to the endpoint. Never retried.
    pub async fn submit(
        &self,
        request: &SubmissionRequest,
    ) -> Result<SubmissionHandle, LifecycleError> {
        let bound = self.endpoint.endpoint_id();
        if request.endpoint() != bound {
            return Err(LifecycleError::SubmissionRejected(
                SubmissionError::EndpointMismatch {
                    requested: request.endpoint().to_string(),
                    bound: bound.to_string(),
                },
            ));
        }

        match self.endpoint.submit(request).await {
            Ok(handle) => {
                info!(handle = %handle, bytes = request.payload().len(), "Transaction submitted");
                Ok(handle)
            }
            Err(SubmissionError::Transport(source)) => {
                error!(error = %source, "Transport failure during submit");
                Err(LifecycleError::EndpointUnavailable {
                    attempts: 1,
                    source,
                })
            }
            Err(e) => {
                warn!(error = %e, "Endpoint refused transaction");
                Err(LifecycleError::SubmissionRejected(e))
            }
        }
    }

    /// Poll `handle` until it leaves `Pending`.
    ///
    /// The first query is issued immediately, later ones every
    /// `poll_interval`. Transport faults are retried with backoff up to the
    /// configured budget. At each wake-up cancellation is checked before the
    /// deadline, and the deadline before the next query.
    pub async fn await_terminal(
        &self,
        handle: &SubmissionHandle,
        poll_interval: Duration,
        timeout: Option<Duration>,
        cancel: &CancellationToken,
    ) -> Result<StatusRecord, LifecycleError> {
        let started = Instant::now();
        let deadline = timeout.map(|t| started + t);
        let mut backoff = ExponentialBackoff::new(self.config.backoff_base, self.config.backoff_max);
        let mut polls = 0u32;
        let mut last_seen = StatusRecord::Pending;

        loop {
            if cancel.is_cancelled() {
                return Err(LifecycleError::Cancelled { polls });
            }

            let reply = tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    info!(handle = %handle, polls, "Confirmation cancelled");
                    return Err(LifecycleError::Cancelled { polls });
                }
                _ = wait_for_deadline(deadline) => {
                    return Err(timed_out(handle, started, polls, last_seen));
                }
                reply = self.endpoint.get_status(handle) => reply,
            };
            polls += 1;

            let wait = match reply {
                Ok(record) => {
                    backoff.on_success();
                    if record.is_terminal() {
                        info!(
                            handle = %handle,
                            polls,
                            status = record.tag(),
                            "Transaction reached terminal status"
                        );
                        return Ok(record);
                    }
                    debug!(handle = %handle, polls, "Waiting for transaction to be confirmed");
                    last_seen = record;
                    poll_interval
                }
                Err(e) => {
                    let wait = backoff.on_failure(&e.to_string());
                    if backoff.should_give_up(self.config.transport_retries) {
                        error!(
                            handle = %handle,
                            attempts = backoff.attempts(),
                            error = %e,
                            "Giving up on endpoint"
                        );
                        return Err(LifecycleError::EndpointUnavailable {
                            attempts: backoff.attempts(),
                            source: e,
                        });
                    }
                    wait
                }
            };

            tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    info!(handle = %handle, polls, "Confirmation cancelled");
                    return Err(LifecycleError::Cancelled { polls });
                }
                _ = wait_for_deadline(deadline) => {
                    return Err(timed_out(handle, started, polls, last_seen));
                }
                _ = tokio::time::sleep(wait) => {}
            }
        }
    }

    /// [`Self::await_terminal`] with the configured interval and timeout
    pub async fn await_terminal_default(
        &self,
        handle: &SubmissionHandle,
        cancel: &CancellationToken,
    ) -> Result<StatusRecord, LifecycleError> {
        self.await_terminal(
            handle,
            self.config.poll_interval,
            self.config.confirm_timeout,
            cancel,
        )
        .await
    }

    /// Submit and wait for a terminal status using the configured policy
    pub async fn submit_and_confirm(
        &self,
        request: &SubmissionRequest,
        cancel: &CancellationToken,
    ) -> Result<(SubmissionHandle, StatusRecord), LifecycleError> {
        let handle = self.submit(request).await?;
        let record = self.await_terminal_default(&handle, cancel).await?;
        Ok((handle, record))
    }

    pub fn extract_scalar<D: ScalarDecoder>(
        &self,
        record: &StatusRecord,
        decoder: &D,
    ) -> Result<D::Value, LifecycleError> {
        extract_scalar(record, decoder)
    }
}

/// Decode the payload of a successful record
pub fn extract_scalar<D: ScalarDecoder>(
    record: &StatusRecord,
    decoder: &D,
) -> Result<D::Value, LifecycleError> {
    match record {
        StatusRecord::Success(payload) => Ok(decoder.decode(payload)?),
        other => Err(LifecycleError::NotTerminalSuccess {
            status: other.tag(),
        }),
    }
}

async fn wait_for_deadline(deadline: Option<Instant>) {
    match deadline {
        Some(at) => tokio::time::sleep_until(at).await,
        None => std::future::pending().await,
    }
}

fn timed_out(
    handle: &SubmissionHandle,
    started: Instant,
    polls: u32,
    last_seen: StatusRecord,
) -> LifecycleError {
    warn!(handle = %handle, polls, "Confirmation deadline elapsed");
    LifecycleError::ConfirmationTimeout {
        handle: handle.clone(),
        waited: started.elapsed(),
        polls,
        last_seen,
    }
}
