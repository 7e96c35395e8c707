// Wipe Orchestrator - Entry point for wipe operations
//
// Two routes to a wiped device:
// - `wipe_device` hands the whole algorithm to an external wiper when one is
//   installed and drops to direct I/O if the tool is missing or fails
// - `execute` runs the algorithm pass by pass through a DeviceBackend
//
// Both return a WipeResult; a failed run still reports how far it got.

pub mod executor;
pub mod nwipe;

use crate::algorithms::{pass_plan, PassSpec};
use crate::crypto::{RandomSource, SystemRandomSource};
use crate::error::{WipeError, WipeErrorResult};
use crate::io::{DeviceBackend, PlatformDevices, WIPE_BUFFER_SIZE};
use crate::{WipeConfig, WipeProgress, WipeResult};
use executor::{PassGeometry, PassLabel, ProgressCallback, WipeExecutor, PROGRESS_INTERVAL};
use nwipe::{external_outcome, ExternalWiper};
use std::io;
use std::ops::ControlFlow;
use std::time::{Duration, Instant};

/// Advisory attached to results for SSD/NVMe targets
pub const WEAR_LEVELING_WARNING: &str = "Flash media detected: wear-leveling may keep copies of \
    old data in blocks that overwriting cannot reach. Use the drive's secure-erase command for \
    stronger guarantees.";

/// Runs wipes against one device backend
pub struct WipeOrchestrator {
    devices: Box<dyn DeviceBackend>,
    rng: Box<dyn RandomSource>,
    external: Box<dyn ExternalWiper>,
    buffer_size: usize,
    progress_interval: Duration,
}

impl WipeOrchestrator {
    /// Real devices, system randomness and nwipe where the platform has it
    pub fn new() -> Self {
        Self::with_backend(PlatformDevices).external_wiper(default_external_wiper())
    }

    /// Custom backend. No external wiper until one is set.
    pub fn with_backend(devices: impl DeviceBackend + 'static) -> Self {
        Self {
            devices: Box::new(devices),
            rng: Box::new(SystemRandomSource::new()),
            external: Box::new(nwipe::NoExternalWiper),
            buffer_size: WIPE_BUFFER_SIZE,
            progress_interval: PROGRESS_INTERVAL,
        }
    }

    pub fn random_source(mut self, rng: impl RandomSource + 'static) -> Self {
        self.rng = Box::new(rng);
        self
    }

    pub fn external_wiper(mut self, external: impl ExternalWiper + 'static) -> Self {
        self.external = Box::new(external);
        self
    }

    pub fn buffer_size(mut self, buffer_size: usize) -> Self {
        self.buffer_size = buffer_size.max(1);
        self
    }

    pub fn progress_interval(mut self, interval: Duration) -> Self {
        self.progress_interval = interval;
        self
    }

    /// External wiper first, direct I/O if it is unavailable or fails.
    pub fn wipe_device(
        &self,
        config: &WipeConfig,
        progress: &mut ProgressCallback<'_>,
    ) -> WipeResult {
        let start = Instant::now();
        let tool = self.external.tool_name();
        let available = self.external.is_available();
        let exit = if available {
            Some(
                self.external
                    .run(&config.device_path, config.algorithm, config.verify),
            )
        } else {
            None
        };

        match external_outcome(&tool, available, exit) {
            Ok(()) => {
                tracing::info!(tool = %tool, device = %config.device_path, "External wipe completed");
                self.external_result(config, start)
            }
            Err(e) if e.triggers_direct_fallback() => {
                if available {
                    tracing::warn!(error = %e, "External wiper failed, falling back to direct I/O");
                } else {
                    tracing::debug!(tool = %tool, "External wiper not installed, using direct I/O");
                }
                let mut result = self.execute(config, progress);
                result.elapsed = start.elapsed();
                result
            }
            Err(e) => {
                let mut result = WipeResult::new(config.algorithm.pass_count());
                result.error = Some(e);
                result.elapsed = start.elapsed();
                result
            }
        }
    }

    /// Direct-I/O wipe: every pass written through the backend, optionally
    /// read back after each one.
    pub fn execute(&self, config: &WipeConfig, progress: &mut ProgressCallback<'_>) -> WipeResult {
        let start = Instant::now();
        let plan = pass_plan(config.algorithm);
        let mut result = WipeResult::new(plan.len());

        tracing::info!(
            device = %config.device_path,
            algorithm = %config.algorithm,
            passes = plan.len(),
            verify = config.verify,
            backend = self.devices.name(),
            "Starting wipe"
        );

        let outcome = self.run_passes(config, &plan, &mut result, progress);
        result.elapsed = start.elapsed();

        match outcome {
            Ok(()) => {
                result.completed = true;
                tracing::info!(
                    passes = result.passes_completed,
                    bytes = result.bytes_written_total,
                    elapsed = %humantime::format_duration(result.elapsed),
                    "Wipe completed"
                );
            }
            Err(e) => {
                if e.is_verification_failure() {
                    result.verification_failures += 1;
                }
                tracing::error!(
                    error = %e,
                    passes_completed = result.passes_completed,
                    "Wipe failed"
                );
                result.error = Some(e);
            }
        }
        result
    }

    fn run_passes(
        &self,
        config: &WipeConfig,
        plan: &[PassSpec],
        result: &mut WipeResult,
        progress: &mut ProgressCallback<'_>,
    ) -> WipeErrorResult<()> {
        result.detected_drive_type = self.devices.drive_type(&config.device_path);
        if result.detected_drive_type.is_flash() {
            tracing::warn!(
                drive_type = %result.detected_drive_type,
                "Overwriting flash media; wear-leveling may retain old blocks"
            );
            result.warnings.push(WEAR_LEVELING_WARNING.to_string());
        }

        let raw = self.devices.raw_path(&config.device_path);
        let size = self
            .devices
            .device_size(&raw)
            .map_err(|e| WipeError::DeviceSizeUnknown {
                device: raw.clone(),
                source: Some(e),
            })?;
        tracing::debug!(device = %raw, size, "Device size");

        if plan.is_empty() {
            return self.readability_scan(&raw, size, progress);
        }

        let mut writer = self
            .devices
            .open_write(&raw)
            .map_err(|source| WipeError::OpenFailed {
                device: raw.clone(),
                write: true,
                source,
            })?;

        let geometry = PassGeometry::new(size, self.buffer_size, writer.alignment());
        ensure_addressable(&raw, geometry, writer.alignment())?;
        if geometry.length < size {
            tracing::warn!(
                skipped = size - geometry.length,
                alignment = writer.alignment(),
                "Device tail is not aligned and will not be overwritten"
            );
        }
        let mut executor = WipeExecutor::new(self.rng.as_ref(), geometry, self.progress_interval)?;
        let pass_count = plan.len();

        for (i, spec) in plan.iter().enumerate() {
            let label = PassLabel {
                index: i + 1,
                count: pass_count,
                spec,
            };
            tracing::info!(pass = label.index, of = pass_count, pattern = spec.description, "Pass started");

            let report = executor.write_pass(writer.as_mut(), label, progress);
            result.bytes_written_total += report.bytes;
            report.into_result()?;

            if config.verify {
                let mut reader =
                    self.devices
                        .open_read(&raw)
                        .map_err(|source| WipeError::OpenFailed {
                            device: raw.clone(),
                            write: false,
                            source,
                        })?;
                executor
                    .verify_pass(reader.as_mut(), label, progress)
                    .into_result()?;
                tracing::debug!(pass = label.index, "Pass verified");
            }

            result.passes_completed = label.index;
        }

        if let Err(e) = writer.close() {
            tracing::debug!(error = %e, "Closing device handle failed after last pass");
        }
        Ok(())
    }

    /// Read the whole device once without writing anything.
    fn readability_scan(
        &self,
        raw: &str,
        size: u64,
        progress: &mut ProgressCallback<'_>,
    ) -> WipeErrorResult<()> {
        let mut reader = self
            .devices
            .open_read(raw)
            .map_err(|source| WipeError::OpenFailed {
                device: raw.to_string(),
                write: false,
                source,
            })?;
        let geometry = PassGeometry::new(size, self.buffer_size, reader.alignment());
        ensure_addressable(raw, geometry, reader.alignment())?;
        let mut executor = WipeExecutor::new(self.rng.as_ref(), geometry, self.progress_interval)?;
        let spec = PassSpec::random("Readability check");
        let label = PassLabel {
            index: 1,
            count: 1,
            spec: &spec,
        };
        executor
            .verify_pass(reader.as_mut(), label, progress)
            .into_result()?;
        Ok(())
    }

    fn external_result(&self, config: &WipeConfig, start: Instant) -> WipeResult {
        let passes = config.algorithm.pass_count();
        let mut result = WipeResult::new(passes);
        result.passes_completed = passes;
        result.completed = true;
        result.detected_drive_type = self.devices.drive_type(&config.device_path);
        if result.detected_drive_type.is_flash() {
            result.warnings.push(WEAR_LEVELING_WARNING.to_string());
        }
        let raw = self.devices.raw_path(&config.device_path);
        if let Ok(size) = self.devices.device_size(&raw) {
            result.bytes_written_total = size * passes as u64;
        }
        result.elapsed = start.elapsed();
        result
    }
}

impl Default for WipeOrchestrator {
    fn default() -> Self {
        Self::new()
    }
}

/// A device shorter than one transfer unit has nothing a pass can cover.
fn ensure_addressable(raw: &str, geometry: PassGeometry, alignment: usize) -> WipeErrorResult<()> {
    if geometry.length == 0 {
        return Err(WipeError::DeviceSizeUnknown {
            device: raw.to_string(),
            source: Some(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("device is smaller than one {}-byte transfer unit", alignment),
            )),
        });
    }
    Ok(())
}

#[cfg(target_os = "linux")]
fn default_external_wiper() -> nwipe::Nwipe {
    nwipe::Nwipe::new()
}

#[cfg(not(target_os = "linux"))]
fn default_external_wiper() -> nwipe::NoExternalWiper {
    nwipe::NoExternalWiper
}

/// Direct-I/O wipe of a real device with a caller-supplied progress callback.
pub fn wipe_execute(
    config: &WipeConfig,
    progress: &mut dyn FnMut(&WipeProgress) -> ControlFlow<()>,
) -> WipeResult {
    WipeOrchestrator::with_backend(PlatformDevices).execute(config, progress)
}

/// Wipe a real device, preferring nwipe when it is installed.
pub fn vault_wipe_device(config: &WipeConfig) -> WipeResult {
    WipeOrchestrator::new().wipe_device(config, &mut |p: &WipeProgress| {
        tracing::debug!(
            pass = p.pass_index,
            of = p.pass_count,
            percent = p.percent(),
            "Wipe progress"
        );
        ControlFlow::Continue(())
    })
}
