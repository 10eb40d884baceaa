//! Коэффициенты контура тангажа в фиксированной точке
//!
//! Пропорциональные коэффициенты и коэффициенты смешивания хранятся в
//! масштабе RMAX, дифференциальные в масштабе RMAX × SCALEGYRO.

use crate::config::flight::PitchGainsConfig;
use crate::config::hardware::{GAIN_SCALE, KD_GAIN_SCALE};
use crate::utils::math::round_to_u16;

/// Коэффициенты, используемые в цикле управления
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ControlGains {
    pub pitch_gain: u16,
    pub pitch_kd: u16,
    pub hover_pitch_gain: u16,
    pub hover_pitch_kd: u16,
    pub rudder_elev_mix: u16,
    pub roll_elev_mix: u16,
}

impl ControlGains {
    /// Перевод настроек в фиксированную точку
    pub fn load(config: &PitchGainsConfig) -> Self {
        Self {
            pitch_gain: round_to_u16(config.pitch_gain * GAIN_SCALE),
            pitch_kd: round_to_u16(config.pitch_kd * KD_GAIN_SCALE),
            hover_pitch_gain: round_to_u16(config.hover_pitch_gain * GAIN_SCALE),
            hover_pitch_kd: round_to_u16(config.hover_pitch_kd * KD_GAIN_SCALE),
            rudder_elev_mix: round_to_u16(config.rudder_elev_mix * GAIN_SCALE),
            roll_elev_mix: round_to_u16(config.roll_elev_mix * GAIN_SCALE),
        }
    }

    /// Обратный перевод для сохранения настроек
    pub fn save(&self) -> PitchGainsConfig {
        PitchGainsConfig {
            pitch_gain: self.pitch_gain as f32 / GAIN_SCALE,
            pitch_kd: self.pitch_kd as f32 / KD_GAIN_SCALE,
            hover_pitch_gain: self.hover_pitch_gain as f32 / GAIN_SCALE,
            hover_pitch_kd: self.hover_pitch_kd as f32 / KD_GAIN_SCALE,
            rudder_elev_mix: self.rudder_elev_mix as f32 / GAIN_SCALE,
            roll_elev_mix: self.roll_elev_mix as f32 / GAIN_SCALE,
        }
    }
}
