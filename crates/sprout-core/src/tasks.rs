//! Periodic task descriptors handed to the scheduler.
//!
//! The table is filled once at startup and then read by whatever runs the
//! workloads: the embassy executor on the board, OS threads in the simulator.
//! Nothing here enforces priorities or periods.

use log::{debug, info};

use crate::config::MonitorConfig;
use crate::error::ConfigError;

/// Index of the monitor workload.
pub const MONITOR_TASK: usize = 0;

/// Index of the transmit workload.
pub const TRANSMIT_TASK: usize = 1;

pub const TASK_COUNT: usize = 2;

/// Work units the board schedules.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Workload {
    /// Sample sensors, update the reading, refresh the display.
    Monitor,
    /// Push the latest reading over the wireless link.
    Transmit,
}

impl Workload {
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Monitor => "monitor",
            Self::Transmit => "transmit",
        }
    }
}

pub type BoardTaskTable = TaskTable<Workload, TASK_COUNT>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TaskDescriptor<W> {
    pub priority: u8,
    pub period_ms: u32,
    pub active: bool,
    pub work: Option<W>,
}

impl<W> TaskDescriptor<W> {
    pub const fn new() -> Self {
        Self {
            priority: 0,
            period_ms: 0,
            active: true,
            work: None,
        }
    }
}

impl<W> Default for TaskDescriptor<W> {
    fn default() -> Self {
        Self::new()
    }
}

/// A descriptor that is active and fully configured.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScheduledTask<W> {
    pub index: usize,
    pub priority: u8,
    pub period_ms: u32,
    pub work: W,
}

/// Fixed-size table of periodic work.
///
/// Setters are independent and may be called in any order. Each one is a
/// logged no-op on an out of range index or an inactive descriptor.
#[derive(Debug, Clone)]
pub struct TaskTable<W, const N: usize> {
    tasks: [TaskDescriptor<W>; N],
}

impl<W: Copy, const N: usize> TaskTable<W, N> {
    pub const fn new() -> Self {
        Self {
            tasks: [TaskDescriptor::new(); N],
        }
    }

    pub fn descriptor(&self, index: usize) -> Option<&TaskDescriptor<W>> {
        self.tasks.get(index)
    }

    pub fn set_priority(&mut self, index: usize, priority: u8) {
        if let Some(task) = self.active_mut(index) {
            task.priority = priority;
        }
    }

    pub fn set_work(&mut self, index: usize, work: W) {
        if let Some(task) = self.active_mut(index) {
            task.work = Some(work);
        }
    }

    pub fn set_period(&mut self, index: usize, period_ms: u32) {
        if let Some(task) = self.active_mut(index) {
            task.period_ms = period_ms;
        }
    }

    /// The only setter that reaches inactive descriptors.
    pub fn set_active(&mut self, index: usize, active: bool) {
        match self.tasks.get_mut(index) {
            Some(task) => task.active = active,
            None => debug!("task {} out of bounds", index),
        }
    }

    /// Priority of an active descriptor.
    ///
    /// `None` for inactive or out of range descriptors, so a configured
    /// priority of 0 stays distinguishable from a failed lookup.
    pub fn priority(&self, index: usize) -> Option<u8> {
        self.active(index).map(|t| t.priority)
    }

    pub fn period_ms(&self, index: usize) -> Option<u32> {
        self.active(index).map(|t| t.period_ms)
    }

    pub fn work(&self, index: usize) -> Option<W> {
        self.active(index).and_then(|t| t.work)
    }

    /// Active descriptors with work attached and a non-zero period, in
    /// table order.
    pub fn scheduled(&self) -> impl Iterator<Item = ScheduledTask<W>> + '_ {
        self.tasks.iter().enumerate().filter_map(|(index, task)| {
            let work = task.work?;
            (task.active && task.period_ms > 0).then_some(ScheduledTask {
                index,
                priority: task.priority,
                period_ms: task.period_ms,
                work,
            })
        })
    }

    fn active(&self, index: usize) -> Option<&TaskDescriptor<W>> {
        match self.tasks.get(index) {
            Some(task) if task.active => Some(task),
            Some(_) => {
                debug!("task {} inactive", index);
                None
            }
            None => {
                debug!("task {} out of bounds", index);
                None
            }
        }
    }

    fn active_mut(&mut self, index: usize) -> Option<&mut TaskDescriptor<W>> {
        match self.tasks.get_mut(index) {
            Some(task) if task.active => Some(task),
            Some(_) => {
                debug!("task {} inactive", index);
                None
            }
            None => {
                debug!("task {} out of bounds", index);
                None
            }
        }
    }
}

impl<W: Copy, const N: usize> Default for TaskTable<W, N> {
    fn default() -> Self {
        Self::new()
    }
}

/// Fill the board's task table from `config`.
pub fn build_task_table(config: &MonitorConfig) -> Result<BoardTaskTable, ConfigError> {
    let entries = [
        (MONITOR_TASK, Workload::Monitor, config.monitor_task),
        (TRANSMIT_TASK, Workload::Transmit, config.transmit_task),
    ];

    let mut table = BoardTaskTable::new();
    for (index, work, timing) in entries {
        if timing.period_ms == 0 {
            return Err(ConfigError::ZeroPeriod { task: work.name() });
        }
        table.set_priority(index, timing.priority);
        table.set_work(index, work);
        table.set_period(index, timing.period_ms);
        info!(
            "task {} '{}': priority {}, every {} ms",
            index,
            work.name(),
            timing.priority,
            timing.period_ms
        );
    }
    Ok(table)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_descriptors_are_active_and_empty() {
        let table = TaskTable::<Workload, 2>::new();
        assert_eq!(table.priority(0), Some(0));
        assert_eq!(table.period_ms(1), Some(0));
        assert_eq!(table.work(0), None);
        assert_eq!(table.scheduled().count(), 0);
    }

    #[test]
    fn test_setters_in_any_order() {
        let mut table = TaskTable::<Workload, 2>::new();
        table.set_period(1, 3000);
        table.set_work(1, Workload::Transmit);
        table.set_priority(1, 2);

        assert_eq!(table.priority(1), Some(2));
        assert_eq!(table.period_ms(1), Some(3000));
        assert_eq!(table.work(1), Some(Workload::Transmit));
    }

    #[test]
    fn test_inactive_descriptor_ignores_setters() {
        let mut table = TaskTable::<Workload, 2>::new();
        table.set_priority(0, 5);
        table.set_active(0, false);

        table.set_priority(0, 9);
        table.set_work(0, Workload::Monitor);
        table.set_period(0, 10);
        assert_eq!(table.priority(0), None);
        assert_eq!(table.work(0), None);

        table.set_active(0, true);
        assert_eq!(
            table.descriptor(0),
            Some(&TaskDescriptor {
                priority: 5,
                period_ms: 0,
                active: true,
                work: None,
            })
        );
    }

    #[test]
    fn test_out_of_bounds_is_neutral() {
        let mut table = TaskTable::<Workload, 2>::new();
        table.set_priority(2, 1);
        table.set_work(7, Workload::Monitor);
        table.set_period(2, 1);
        table.set_active(2, false);

        assert_eq!(table.priority(2), None);
        assert_eq!(table.period_ms(2), None);
        assert_eq!(table.work(2), None);
        assert!(table.descriptor(2).is_none());
    }

    #[test]
    fn test_scheduled_skips_incomplete_and_inactive() {
        let mut table = TaskTable::<Workload, 3>::new();
        table.set_work(0, Workload::Monitor);
        table.set_period(0, 1000);
        table.set_priority(0, 1);
        // No period.
        table.set_work(1, Workload::Transmit);
        table.set_work(2, Workload::Transmit);
        table.set_period(2, 3000);
        table.set_active(2, false);

        let scheduled: Vec<_> = table.scheduled().collect();
        assert_eq!(
            scheduled,
            [ScheduledTask {
                index: 0,
                priority: 1,
                period_ms: 1000,
                work: Workload::Monitor,
            }]
        );
    }

    #[test]
    fn test_board_table_from_default_config() {
        let table = build_task_table(&MonitorConfig::default()).unwrap();
        let scheduled: Vec<_> = table.scheduled().collect();

        assert_eq!(scheduled.len(), 2);
        assert_eq!(scheduled[0].work, Workload::Monitor);
        assert_eq!(scheduled[0].priority, 1);
        assert_eq!(scheduled[0].period_ms, 1000);
        assert_eq!(scheduled[1].work, Workload::Transmit);
        assert_eq!(scheduled[1].priority, 2);
        assert_eq!(scheduled[1].period_ms, 3000);
    }

    #[test]
    fn test_board_table_rejects_zero_period() {
        let mut config = MonitorConfig::default();
        config.monitor_task.period_ms = 0;
        assert_eq!(
            build_task_table(&config).err(),
            Some(ConfigError::ZeroPeriod { task: "monitor" })
        );
    }
}
