//! Cooperative tick-driven task scheduler for bare-metal firmware
//!
//! A timer interrupt calls [`os::SharedScheduler::tick`]; the main loop
//! calls [`os::SharedScheduler::dispatch`], which runs every callback that
//! has become due. Pending tasks are kept in a delta queue so the interrupt
//! handler only ever touches the queue head.
#![cfg_attr(not(test), no_std)]

pub mod config;
pub mod diagnostics;
pub mod hal;
pub mod logger;
pub mod os;
pub mod rtos;

pub use os::{SharedScheduler, SCHEDULER};
pub use rtos::{ErrorCode, Scheduler, TaskBuilder, TaskFn, TaskId};
