//! Задачи embassy прошивки

pub mod control_task;
