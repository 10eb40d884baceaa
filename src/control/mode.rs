//! Выбор закона управления тангажом

/// Закон управления тангажом на текущем такте
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PitchMode {
    /// Самолетный полет
    #[default]
    Forward,
    /// Висение
    Hover,
}

impl PitchMode {
    /// Висение выбирается, только если оно возможно и требуется поведением
    pub const fn select(hover_capable: bool, hover_desired: bool) -> Self {
        if hover_capable && hover_desired {
            PitchMode::Hover
        } else {
            PitchMode::Forward
        }
    }
}
