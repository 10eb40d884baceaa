//! Закон управления тангажом в режиме висения
//!
//! Вектор тяги удерживается по третьему элементу третьей строки матрицы.
//! Пилот смещает уставку ручкой руля высоты, навигация наклоняет аппарат в
//! сторону путевой точки пропорционально расстоянию.

use crate::config::flight::{FlightConfig, RampOrder};
use crate::config::hardware::radio::STICK_TO_RMAX;
use crate::control::gains::ControlGains;
use crate::control::mode::PitchMode;
use crate::control::reverse_if_needed;
use crate::data::{PitchInputs, PitchOutput};
use crate::utils::fixed::{Fixed, Fractional};
use crate::utils::math::deg_to_rmat;

/// Закон режима висения с константами, переведенными в фиксированную точку
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct HoverLaw {
    fixed: Fixed,
    /// Смещение тангажа
    pitch_offset: Fractional,
    /// Наибольший наклон к путевой точке
    pitch_towards_wp: Fractional,
    /// Радиус, за которым наклон не растет. Всегда положителен.
    max_pitch_radius: i16,
    ramp_order: RampOrder,
    elevator_input: Option<usize>,
    elevator_reversed: bool,
}

impl HoverLaw {
    /// Радиус должен быть уже проверен [`FlightConfig::validate`]
    pub(crate) fn new(config: &FlightConfig) -> Self {
        let fixed = Fixed::new(config.overflow);
        Self {
            fixed,
            pitch_offset: fixed.narrow(deg_to_rmat(config.hover_pitch_offset_deg)),
            pitch_towards_wp: fixed.narrow(deg_to_rmat(config.hover_pitch_towards_wp_deg)),
            max_pitch_radius: config.hover_nav_max_pitch_radius.max(1),
            ramp_order: config.hover_ramp_order,
            elevator_input: config.channels.elevator_input,
            elevator_reversed: config.channels.elevator_reversed,
        }
    }

    /// Наклон к путевой точке в зависимости от расстояния до нее
    pub fn pitch_toward_target(&self, distance: i16) -> i32 {
        let max = self.pitch_towards_wp.wide();
        if distance > self.max_pitch_radius {
            return max;
        }
        let radius = self.max_pitch_radius as i32;
        match self.ramp_order {
            RampOrder::DivideFirst => max / radius * distance as i32,
            RampOrder::MultiplyFirst => max * distance as i32 / radius,
        }
    }

    pub fn update(&self, gains: &ControlGains, inputs: &PitchInputs) -> PitchOutput {
        let flags = &inputs.flags;
        if !flags.pitch_feedback {
            return PitchOutput {
                mode: PitchMode::Hover,
                ..PitchOutput::default()
            };
        }

        let fx = &self.fixed;
        let [rmat6, rmat7, rmat8] = inputs.attitude.third_row().map(|r| fx.frac(r));

        // (−rmat7 × ωx − rmat6 × ωy) << 1
        let rate_acc = fx.sub_wide(
            Fixed::mul_ss((-rmat7).raw(), inputs.rates.roll()),
            Fixed::mul_ss(rmat6.raw(), inputs.rates.pitch()),
        );
        let pitch_rate = Fixed::high_word(fx.shl(rate_acc, 1));

        let elev_input = if flags.radio_on {
            fx.narrow(reverse_if_needed(
                self.elevator_reversed,
                inputs.radio.input_deflection(self.elevator_input),
            ))
        } else {
            fx.frac(0)
        };
        let manual_offset = fx.narrow(elev_input.wide() * STICK_TO_RMAX as i32);

        let to_target = if flags.gps_steering {
            self.pitch_toward_target(inputs.nav.to_finish_line)
        } else {
            0
        };

        let error = fx.narrow(
            fx.add_wide(
                fx.sub_wide(rmat8.wide() + self.pitch_offset.wide(), to_target),
                manual_offset.wide(),
            ),
        );
        let acc = fx.add_wide(
            Fixed::mul_su(error.raw(), gains.hover_pitch_gain),
            Fixed::mul_us(gains.hover_pitch_kd, pitch_rate),
        );

        PitchOutput {
            command: Fixed::high_word(acc) as i32,
            pitch_rate,
            nav_elev_mix: 0,
            rtl_kick: 0,
            failsafe: false,
            mode: PitchMode::Hover,
        }
    }
}
