//! Simulation kernel: lifecycle, time advancement and the stabilization loop.
//!
//! [`SimKernel`] owns the [`Runset`] and the simulated clock. `setup()`
//! registers processes and initializes frames, `simulate(duration)` advances
//! time step by step, and every step runs delta cycles until the design is
//! stable or the cycle cap is reached. Hitting the cap is logged and
//! recorded; the run continues with the next time step.

use crate::config::SimConfig;
use crate::error::SimError;
use crate::inspect::ModuleInspector;
use crate::instance::InstanceId;
use crate::instrument::{Instrumenter, ModuleHandle};
use crate::runset::Runset;
use cell_common::{Interner, Time};
use cell_config::DEFAULT_MAX_CYCLES;
use cell_ir::{Design, ModuleId, Value};
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, warn};

/// Summary of one `simulate` call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimReport {
    /// Simulation time when the call returned.
    pub final_time: Time,
    /// Number of time steps executed.
    pub steps: u64,
    /// Number of delta cycles executed.
    pub total_deltas: u64,
    /// Time steps that hit the delta-cycle cap.
    pub non_converged: Vec<Time>,
}

/// The simulation kernel.
///
/// Construct with [`SimKernel::new`], then call [`setup`](SimKernel::setup)
/// before simulating or inspecting.
pub struct SimKernel {
    runset: Runset,
    top: ModuleId,
    top_name: String,
    max_cycles: u32,
    current_time: Time,
    set_up: bool,
    instrumenter: Option<Box<dyn Instrumenter>>,
    total_deltas: u64,
    non_converged: Vec<Time>,
}

impl SimKernel {
    /// Creates a kernel for the module at `top`, e.g. `"test::counter"`.
    ///
    /// Fails if the path does not name a module or if the design contains
    /// recursive instantiation. The instance tree is flattened immediately.
    pub fn new(design: &Design, top: &str, interner: &Interner) -> Result<Self, SimError> {
        let top_id = design
            .find_module(top, interner)
            .ok_or_else(|| SimError::UnknownModule {
                path: top.to_string(),
                available: design.module_names(interner),
            })?;
        if let Some(module) = design.instantiation_cycle() {
            return Err(SimError::RecursiveInstantiation {
                module: interner.resolve(design.module(module).name).to_string(),
            });
        }

        let mut runset = Runset::new(design, interner);
        runset.add_module(top_id, String::new(), None);
        debug!(top, instances = runset.len(), "flattened design");

        Ok(Self {
            runset,
            top: top_id,
            top_name: top.to_string(),
            max_cycles: DEFAULT_MAX_CYCLES,
            current_time: Time::zero(),
            set_up: false,
            instrumenter: None,
            total_deltas: 0,
            non_converged: Vec::new(),
        })
    }

    /// Creates a kernel and applies the run configuration.
    pub fn with_config(
        design: &Design,
        top: &str,
        config: &SimConfig,
        interner: &Interner,
    ) -> Result<Self, SimError> {
        let mut kernel = Self::new(design, top, interner)?;
        kernel.set_max_cycles(config.max_cycles);
        Ok(kernel)
    }

    /// Sets the delta-cycle cap per time step. Values below 1 count as 1.
    pub fn set_max_cycles(&mut self, max_cycles: u32) {
        self.max_cycles = max_cycles.max(1);
    }

    /// The delta-cycle cap per time step.
    pub fn max_cycles(&self) -> u32 {
        self.max_cycles
    }

    /// Attaches an instrumenter. Registration happens during `setup()`.
    pub fn set_instrumenter(&mut self, instrumenter: Box<dyn Instrumenter>) {
        self.instrumenter = Some(instrumenter);
    }

    /// Detaches and returns the instrumenter.
    pub fn take_instrumenter(&mut self) -> Option<Box<dyn Instrumenter>> {
        self.instrumenter.take()
    }

    /// The current simulation time.
    pub fn current_time(&self) -> Time {
        self.current_time
    }

    /// Whether `setup()` has completed.
    pub fn is_set_up(&self) -> bool {
        self.set_up
    }

    /// The module instances.
    pub fn runset(&self) -> &Runset {
        &self.runset
    }

    /// Attaches a driver callback to the instance at `path`.
    ///
    /// The callback runs at the start of every delta cycle with
    /// `(time, current, next, previous)` and may write into `next`.
    pub fn add_driver<F>(&mut self, path: &str, driver: F) -> Result<(), SimError>
    where
        F: FnMut(Time, &[u8], &mut [u8], &[u8]) + 'static,
    {
        let id = self.find_instance(path)?;
        self.runset.add_driver(id, driver);
        Ok(())
    }

    /// Registers processes, initializes every frame and notifies the
    /// instrumenter.
    pub fn setup(&mut self) -> Result<(), SimError> {
        if self.set_up {
            return Err(SimError::AlreadySetUp);
        }
        if self.runset.is_empty() {
            self.runset.add_module(self.top, String::new(), None);
        }
        self.runset.setup_hierarchy();
        self.runset.call_init();
        self.current_time = Time::zero();
        self.total_deltas = 0;
        self.non_converged.clear();

        if let Some(instrumenter) = self.instrumenter.as_mut() {
            if let Some(root) = self.runset.root() {
                register_hierarchy(instrumenter.as_mut(), &self.runset, root)?;
            }
            instrumenter.initial(Time::zero(), &self.runset)?;
        }

        self.set_up = true;
        info!(top = %self.top_name, instances = self.runset.len(), "simulation set up");
        Ok(())
    }

    /// Advances simulated time by `duration`.
    ///
    /// Steps run at the current time and at every scheduled activation
    /// before the end. The current time afterwards is the start plus
    /// `duration`, so consecutive calls continue seamlessly.
    pub fn simulate(&mut self, duration: Time) -> Result<SimReport, SimError> {
        self.require_setup()?;
        let start = self.current_time.to_ps();
        let duration = if duration.value > 0 {
            duration.to_ps()
        } else {
            Time::zero()
        };
        let end = start + duration;
        info!(%duration, %start, "simulating");

        let deltas_before = self.total_deltas;
        let non_converged_before = self.non_converged.len();
        let mut steps = 0u64;
        let mut t = start;
        while t < end {
            let next_t = self.simulate_step(t, end - t)?;
            steps += 1;
            if let Some(instrumenter) = self.instrumenter.as_mut() {
                instrumenter.step(t, &self.runset)?;
            }
            t = next_t;
        }
        self.current_time = end;
        if let Some(instrumenter) = self.instrumenter.as_mut() {
            instrumenter.flush()?;
        }

        let report = SimReport {
            final_time: end,
            steps,
            total_deltas: self.total_deltas - deltas_before,
            non_converged: self.non_converged[non_converged_before..].to_vec(),
        };
        info!(
            final_time = %report.final_time,
            steps = report.steps,
            deltas = report.total_deltas,
            non_converged = report.non_converged.len(),
            "simulation finished"
        );
        Ok(report)
    }

    /// Executes the time step at `t` and returns the time of the next one,
    /// at most `t + duration`.
    ///
    /// Due periodic and one-shot processes are queued, recurrent processes
    /// are invoked and rescheduled, then delta cycles run until no process
    /// is pending or the cap is reached.
    pub fn simulate_step(&mut self, t: Time, duration: Time) -> Result<Time, SimError> {
        self.require_setup()?;
        let t = t.to_ps();
        debug!(time = %t, "time step");

        let ids: Vec<InstanceId> = self.runset.instances.ids().collect();
        for &id in &ids {
            let inst = &mut self.runset.instances[id];
            for (period, pid) in inst.schedule.pop_periodic(t) {
                inst.run_list.insert(pid);
                if period.value > 0 {
                    inst.schedule.schedule(t + period, period, pid);
                }
            }

            let recurrent = inst.schedule.pop_recurrent(t);
            for pid in recurrent {
                let Some(next_ps) = self.runset.run_process(id, pid, t) else {
                    continue;
                };
                let next = Time::ps(next_ps);
                if next > t {
                    self.runset.instances[id]
                        .schedule
                        .schedule_recurrent(next, pid);
                } else {
                    warn!(
                        instance = %self.runset.instances[id].display_name(),
                        process = pid.as_raw(),
                        time = %t,
                        requested = %next,
                        "recurrent process did not advance its wake time, retiring it"
                    );
                }
            }
        }

        let mut next_t = t + duration.to_ps();
        for inst in self.runset.instances.values() {
            if let Some(scheduled) = inst.schedule.next_time() {
                next_t = next_t.min(scheduled);
            }
        }

        let mut cycles = 0u32;
        loop {
            let rerun = self.runset.simulate_cycle(t, cycles == 0);
            cycles += 1;
            if !rerun {
                break;
            }
            if cycles >= self.max_cycles {
                error!(
                    time = %t,
                    max_cycles = self.max_cycles,
                    "exceeded max number of delta cycles, probably a combinational loop"
                );
                self.non_converged.push(t);
                break;
            }
        }
        self.total_deltas += u64::from(cycles);
        debug!(time = %t, cycles, next = %next_t, "time step done");
        Ok(next_t)
    }

    /// Runs a single delta cycle at `t` and returns whether another is
    /// needed. Does not touch `previous`.
    pub fn simulate_cycle(&mut self, t: Time) -> Result<bool, SimError> {
        self.require_setup()?;
        let rerun = self.runset.simulate_cycle(t, false);
        self.total_deltas += 1;
        Ok(rerun)
    }

    /// Drops every instance and returns to the not-set-up state.
    ///
    /// A later `setup()` rebuilds the instance tree from scratch; attached
    /// drivers are dropped with it.
    pub fn teardown(&mut self) {
        self.runset.clear();
        self.set_up = false;
        debug!(top = %self.top_name, "simulation torn down");
    }

    /// Returns an inspector for the instance at `path` (`""` for the top).
    pub fn inspect(&self, path: &str) -> Result<ModuleInspector<'_>, SimError> {
        self.require_setup()?;
        let id = self.find_instance(path)?;
        Ok(ModuleInspector::new(&self.runset, id))
    }

    /// Calls a module function on the instance at `path`.
    ///
    /// Writes the function makes are committed to `current`, and processes
    /// sensitive to the changed elements are queued for the next delta
    /// cycle.
    pub fn call(
        &mut self,
        path: &str,
        function: &str,
        args: &[Value],
    ) -> Result<Option<Value>, SimError> {
        self.require_setup()?;
        let id = self.find_instance(path)?;
        let module = std::sync::Arc::clone(&self.runset.instances[id].module);
        let index = module
            .function_index(function)
            .ok_or_else(|| SimError::UnknownFunction {
                module: module.name.clone(),
                function: function.to_string(),
            })?;
        let def = &module.def.functions[index];

        if def.params.len() != args.len() {
            return Err(SimError::ArgumentMismatch {
                function: function.to_string(),
                reason: format!("expected {} arguments, got {}", def.params.len(), args.len()),
            });
        }
        for (i, (param, arg)) in def.params.iter().zip(args).enumerate() {
            if *param != arg.value_type() {
                return Err(SimError::ArgumentMismatch {
                    function: function.to_string(),
                    reason: format!("argument {i} should be {param}, got {}", arg.value_type()),
                });
            }
        }

        let ret = self.runset.call_function(id, def, args);
        let changed = self.runset.commit_external(id);
        debug!(
            instance = %self.runset.instances[id].display_name(),
            function,
            changed = changed.len(),
            "called function"
        );
        Ok(ret)
    }

    fn require_setup(&self) -> Result<(), SimError> {
        if self.set_up {
            Ok(())
        } else {
            Err(SimError::NotSetUp)
        }
    }

    fn find_instance(&self, path: &str) -> Result<InstanceId, SimError> {
        self.runset
            .find(path)
            .ok_or_else(|| SimError::UnknownModule {
                path: path.to_string(),
                available: self.runset.paths(),
            })
    }
}

/// Registers `id` and its descendants in hierarchical pre-order.
fn register_hierarchy(
    instrumenter: &mut dyn Instrumenter,
    runset: &Runset,
    id: InstanceId,
) -> Result<(), SimError> {
    let inst = runset.instance(id);
    instrumenter.push_hierarchy(inst.name())?;
    instrumenter.register_module(ModuleHandle::new(id, inst))?;
    for edge in inst.children() {
        register_hierarchy(instrumenter, runset, edge.instance)?;
    }
    instrumenter.pop_hierarchy()
}
