//! Implementations for the control loop state structure

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use log::{debug, trace};
use std::time::{Duration, Instant};

use super::{CycleError, CyclePhase, CycleReport, Response};
use crate::{
    cmd_translator,
    frame,
    latency::LatencyCompensator,
    optimiser::Optimiser,
    params::{CteMode, Params, ParamsError},
    pose::{ControlCommand, Pose, VehicleState, Waypoints},
    ref_fit,
    track_err,
};
use comms_if::sim::{self, SteerData, Telemetry};
use util::module::State;

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// Control loop state for one connection.
pub struct ControlLoop<O> {
    params: Params,
    compensator: LatencyCompensator,
    optimiser: O,

    /// How long each steering response is held before it is sent
    hold: Duration,

    phase: CyclePhase,

    /// The command the vehicle is currently executing
    last_cmd: ControlCommand,

    /// The command computed by the cycle in flight, applied once sent
    pending_cmd: Option<ControlCommand>,
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl<O: Optimiser> ControlLoop<O> {
    /// Create a new loop with default parameters. Call [`State::init`] to
    /// provide the real ones.
    pub fn new(optimiser: O) -> Self {
        let params = Params::default();

        Self {
            compensator: LatencyCompensator::from_params(&params),
            hold: params.latency().unwrap_or_default(),
            params,
            optimiser,
            phase: CyclePhase::AwaitingMessage,
            last_cmd: ControlCommand::default(),
            pending_cmd: None,
        }
    }

    pub fn phase(&self) -> CyclePhase {
        self.phase
    }

    pub fn last_command(&self) -> ControlCommand {
        self.last_cmd
    }

    pub fn optimiser(&self) -> &O {
        &self.optimiser
    }

    /// Mark the hold period of the current cycle as over, the response is
    /// about to be sent.
    pub fn hold_elapsed(&mut self) -> Result<(), CycleError> {
        self.expect_phase(CyclePhase::Delaying)?;
        self.set_phase(CyclePhase::Responding);

        Ok(())
    }

    /// Mark the current cycle's response as sent. The command it carried
    /// becomes the one the vehicle is executing.
    pub fn cycle_complete(&mut self) -> Result<(), CycleError> {
        self.expect_phase(CyclePhase::Responding)?;

        if let Some(cmd) = self.pending_cmd.take() {
            self.last_cmd = cmd;
        }
        self.set_phase(CyclePhase::AwaitingMessage);

        Ok(())
    }

    fn set_phase(&mut self, phase: CyclePhase) {
        trace!("{:?} -> {:?}", self.phase, phase);
        self.phase = phase;
    }

    fn expect_phase(&self, expected: CyclePhase) -> Result<(), CycleError> {
        if self.phase != expected {
            return Err(CycleError::UnexpectedPhase {
                expected,
                found: self.phase,
            });
        }

        Ok(())
    }

    /// Run the pipeline on decoded telemetry, from compensation up to the
    /// start of the hold.
    fn run_pipeline(
        &mut self,
        telemetry: &Telemetry,
    ) -> Result<(Response, CycleReport), CycleError> {
        let mut report = CycleReport {
            num_waypoints: telemetry.ptsx.len(),
            ..Default::default()
        };

        // Use what the simulator reports it is applying, falling back to what
        // we last sent for anything it omits
        self.set_phase(CyclePhase::Compensating);
        let applied = ControlCommand {
            steering: telemetry.steering_angle.unwrap_or(self.last_cmd.steering),
            throttle: telemetry.throttle.unwrap_or(self.last_cmd.throttle),
        };
        let measured = Pose::from_telemetry(telemetry, self.params.speed_conv_factor);
        let projected = self.compensator.project(&measured, &applied);
        report.projected_pose = projected;

        self.set_phase(CyclePhase::Transforming);
        let world_pts = Waypoints::from_xy(&telemetry.ptsx, &telemetry.ptsy);
        let vehicle_pts = frame::to_vehicle_frame(&world_pts, &projected);

        self.set_phase(CyclePhase::Fitting);
        let coeffs = ref_fit::fit(&vehicle_pts).map_err(CycleError::DegenerateFit)?;
        report.coeffs = coeffs;

        self.set_phase(CyclePhase::Estimating);
        let ref_y = match self.params.cte_mode {
            CteMode::VehicleFrame => 0.0,
            CteMode::WorldY => projected.y_m,
        };
        let errors = track_err::estimate(&coeffs, ref_y);
        report.cte_m = errors.cte_m;
        report.epsi_rad = errors.epsi_rad;

        let state = VehicleState::at_origin(projected.speed_ms, errors.cte_m, errors.epsi_rad);

        self.set_phase(CyclePhase::Solving);
        let solve_start = Instant::now();
        let raw = self.optimiser.solve(&state, &coeffs);
        report.solve_time_s = solve_start.elapsed().as_secs_f64();

        self.set_phase(CyclePhase::Translating);
        let (cmd, traj) = cmd_translator::translate(&raw, self.params.max_steer_rad)
            .map_err(CycleError::MalformedOutput)?;

        let frame = sim::encode_steer(&SteerData {
            steering_angle: cmd.steering,
            throttle: cmd.throttle,
            mpc_x: traj.xs(),
            mpc_y: traj.ys(),
            next_x: vehicle_pts.xs(),
            next_y: vehicle_pts.ys(),
        })
        .map_err(CycleError::EncodeError)?;

        debug!(
            "cte {:.3} m, epsi {:.4} rad -> steering {:.3}, throttle {:.3} (solve {:.1} ms)",
            report.cte_m,
            report.epsi_rad,
            cmd.steering,
            cmd.throttle,
            report.solve_time_s * 1e3
        );

        self.set_phase(CyclePhase::Delaying);
        self.pending_cmd = Some(cmd);

        Ok((
            Response::Steer {
                frame,
                hold: self.hold,
            },
            report,
        ))
    }
}

impl<O: Optimiser> State for ControlLoop<O> {
    type InitData = Params;
    type InitError = ParamsError;

    type InputData = str;
    type OutputData = Response;
    type StatusReport = CycleReport;
    type ProcError = CycleError;

    /// Initialise the loop with validated parameters, clearing any previous
    /// cycle.
    fn init(&mut self, init_data: Self::InitData) -> Result<(), Self::InitError> {
        init_data.validate()?;

        self.hold = init_data.latency()?;
        self.compensator = LatencyCompensator::from_params(&init_data);
        self.params = init_data;
        self.phase = CyclePhase::AwaitingMessage;
        self.last_cmd = ControlCommand::default();
        self.pending_cmd = None;

        Ok(())
    }

    /// Process one inbound text frame.
    fn proc(
        &mut self,
        input_data: &Self::InputData,
    ) -> Result<(Self::OutputData, Self::StatusReport), Self::ProcError> {
        if self.phase != CyclePhase::AwaitingMessage {
            return Err(CycleError::CycleInProgress(self.phase));
        }

        self.set_phase(CyclePhase::Decoding);
        let telemetry = match sim::decode_telemetry(input_data) {
            Ok(t) => t,
            Err(e) if e.is_manual_fallback() => {
                debug!("No usable telemetry ({}), handing back to manual", e);
                self.set_phase(CyclePhase::ManualFallback);
                self.set_phase(CyclePhase::AwaitingMessage);
                return Ok((
                    Response::Manual(sim::MANUAL_FRAME.into()),
                    CycleReport::default(),
                ));
            }
            Err(e) => {
                trace!("Ignoring frame: {}", e);
                self.set_phase(CyclePhase::AwaitingMessage);
                return Ok((Response::Ignore, CycleReport::default()));
            }
        };

        match self.run_pipeline(&telemetry) {
            Ok(r) => Ok(r),
            Err(e) => {
                self.set_phase(CyclePhase::AwaitingMessage);
                Err(e)
            }
        }
    }
}

// ------------------------------------------------------------------------------------------------
// TESTS
// ------------------------------------------------------------------------------------------------
