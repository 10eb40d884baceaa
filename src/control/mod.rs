//! Контур тангажа: выбор режима и законы управления

pub mod forward;
pub mod gains;
pub mod hover;
pub mod mode;
pub mod pitch;

pub use gains::ControlGains;
pub use mode::PitchMode;
pub use pitch::PitchController;

/// Смена знака отклонения для инвертированного канала
#[inline]
pub(crate) fn reverse_if_needed(reversed: bool, value: i32) -> i32 {
    if reversed {
        -value
    } else {
        value
    }
}
