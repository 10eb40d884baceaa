//! Закон управления тангажом в самолетном режиме
//!
//! Стабилизация по третьей строке матрицы ориентации, демпфирование по
//! оценке угловой скорости тангажа, координация разворота и опускание носа
//! при потере связи.

use crate::config::flight::FlightConfig;
use crate::config::hardware::radio::RadioChannelMap;
use crate::control::gains::ControlGains;
use crate::control::mode::PitchMode;
use crate::control::reverse_if_needed;
use crate::data::{AltitudeTrim, Orientation, PitchInputs, PitchOutput};
use crate::utils::fixed::{Fixed, Fractional, Shift};
use crate::utils::math::deg_to_rmat;

/// Закон самолетного режима с константами, переведенными в фиксированную точку
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ForwardLaw {
    fixed: Fixed,
    /// Опускание носа при потере связи
    rtl_kick: Fractional,
    /// Нейтральный тангаж в перевернутом полете
    inverted_neutral_pitch: Fractional,
    pitch_stabilization: bool,
    glide_airspeed_control: bool,
    test_gains: bool,
    channels: RadioChannelMap,
}

impl ForwardLaw {
    /// Углы вне диапазона Q1.14 приводятся по политике переполнения
    pub(crate) fn new(config: &FlightConfig) -> Self {
        let fixed = Fixed::new(config.overflow);
        Self {
            fixed,
            rtl_kick: fixed.narrow(deg_to_rmat(config.rtl_pitch_down_deg)),
            inverted_neutral_pitch: fixed.narrow(deg_to_rmat(config.inverted_neutral_pitch_deg)),
            pitch_stabilization: config.pitch_stabilization,
            glide_airspeed_control: config.glide_airspeed_control,
            test_gains: config.test_gains,
            channels: config.channels,
        }
    }

    /// Опускание носа при потере связи
    pub fn rtl_kick(&self) -> Fractional {
        self.rtl_kick
    }

    /// Один такт закона.
    ///
    /// В перевернутом полете перезаписывает поправку регулятора высоты.
    pub fn update<T: AltitudeTrim>(
        &self,
        gains: &ControlGains,
        inputs: &PitchInputs,
        trim: &mut T,
    ) -> PitchOutput {
        let fx = &self.fixed;

        let mut flags = inputs.flags;
        if self.test_gains {
            flags.gps_steering = false;
            flags.pitch_feedback = true;
        }

        let [raw6, raw7, raw8] = inputs.attitude.third_row().map(|r| fx.frac(r));
        let (rmat6, rmat7, rmat8) =
            if flags.can_stabilize_inverted && flags.orientation == Orientation::Inverted {
                let adjusted = -fx.frac(trim.read_trim()) - self.inverted_neutral_pitch;
                trim.write_trim(adjusted.raw());
                (-raw6, -raw7, -raw8)
            } else {
                (raw6, raw7, raw8)
            };

        let nav_elev_mix = if flags.pitch_feedback {
            self.turn_coordination(gains, inputs, rmat6, raw6)
        } else {
            fx.frac(0)
        };

        // (rmat8 × ωx − rmat6 × ωz) << 1
        let rate_acc = fx.sub_wide(
            Fixed::mul_ss(rmat8.raw(), inputs.rates.roll()),
            Fixed::mul_ss(rmat6.raw(), inputs.rates.yaw()),
        );
        let pitch_rate = Fixed::high_word(fx.shl(rate_acc, 1));

        let failsafe = !flags.radio_on && flags.gps_steering;
        let rtl_kick = if failsafe { self.rtl_kick } else { fx.frac(0) };

        let glide_adjust = if self.glide_airspeed_control {
            inputs.glide_pitch_adjust.unwrap_or(0)
        } else {
            0
        };

        let acc = if self.pitch_stabilization && flags.pitch_feedback {
            let error = fx.narrow(
                rmat7.wide() - rtl_kick.wide() + glide_adjust as i32 + trim.read_trim() as i32,
            );
            fx.add_wide(
                Fixed::mul_su(error.raw(), gains.pitch_gain),
                Fixed::mul_us(gains.pitch_kd, pitch_rate),
            )
        } else {
            0
        };

        PitchOutput {
            command: Fixed::high_word(acc) as i32 + nav_elev_mix.wide(),
            pitch_rate,
            nav_elev_mix: nav_elev_mix.raw(),
            rtl_kick: rtl_kick.raw(),
            failsafe,
            mode: PitchMode::Forward,
        }
    }

    /// Вклад руля направления и крена в руль высоты.
    ///
    /// Второй множитель креновой составляющей берется из необработанной матрицы,
    /// без смены знака в перевернутом полете.
    fn turn_coordination(
        &self,
        gains: &ControlGains,
        inputs: &PitchInputs,
        rmat6: Fractional,
        raw6: Fractional,
    ) -> Fractional {
        let fx = &self.fixed;
        let mut mix = fx.frac(0);

        if let (Some(input), Some(output)) = (self.channels.rudder_input, self.channels.rudder_output)
        {
            let rudder = fx.narrow(reverse_if_needed(
                self.channels.rudder_reversed,
                inputs.radio.trim_minus_output(input, output),
            ));
            let scaled = fx.scaled_mul_su(rmat6, gains.rudder_elev_mix, Shift::Left(1));
            mix = mix + fx.scaled_mul_ss(scaled, rudder, Shift::Left(3));
        }

        let bank = fx.scaled_mul_su(rmat6, gains.roll_elev_mix, Shift::Left(1));
        mix + fx.scaled_mul_ss(bank, raw6, Shift::Right(3))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::flight::PitchGainsConfig;
    use crate::config::hardware::RMAX;
    use crate::data::{AngularRate, AttitudeMatrix, TrimCell};
    use crate::utils::fixed::OverflowPolicy;

    fn config_with_gain(pitch_gain: f32) -> FlightConfig {
        FlightConfig {
            gains: PitchGainsConfig {
                pitch_gain,
                ..PitchGainsConfig::default()
            },
            ..FlightConfig::default()
        }
    }

    fn attitude(r6: i16, r7: i16, r8: i16) -> AttitudeMatrix {
        AttitudeMatrix::from_row_major([RMAX, 0, 0, 0, RMAX, 0, r6, r7, r8])
    }

    fn stabilized_inputs() -> PitchInputs {
        let mut inputs = PitchInputs::default();
        inputs.flags.pitch_feedback = true;
        inputs
    }

    fn run(config: &FlightConfig, inputs: &PitchInputs, trim: &mut TrimCell) -> PitchOutput {
        let law = ForwardLaw::new(config);
        law.update(&ControlGains::load(&config.gains), inputs, trim)
    }

    #[test]
    fn test_level_flight_gives_zero() {
        let config = FlightConfig::default();
        let mut trim = TrimCell(0);
        let out = run(&config, &stabilized_inputs(), &mut trim);

        assert_eq!(out.command, 0);
        assert_eq!(out.pitch_rate, 0);
        assert_eq!(out.nav_elev_mix, 0);
        assert_eq!(out.rtl_kick, 0);
        assert_eq!(out.mode, PitchMode::Forward);
    }

    #[test]
    fn test_proportional_term() {
        // Коэффициент 2.0 = 32768: старшее слово равно половине ошибки
        let config = config_with_gain(2.0);
        let mut inputs = stabilized_inputs();
        inputs.attitude = attitude(0, 1000, RMAX);
        let mut trim = TrimCell(200);

        assert_eq!(run(&config, &inputs, &mut trim).command, 600);
        assert_eq!(trim, TrimCell(200));
    }

    #[test]
    fn test_inverted_output_mirrors_normal() {
        let mut config = config_with_gain(2.0);
        config.inverted_neutral_pitch_deg = 16.0;
        let inverted_neutral = deg_to_rmat(16.0);
        assert_eq!(inverted_neutral, 4574);

        let mut inputs = stabilized_inputs();
        inputs.attitude = attitude(0, 1000, RMAX);
        inputs.flags.can_stabilize_inverted = true;

        let mut trim = TrimCell(200);
        let normal = run(&config, &inputs, &mut trim);

        inputs.flags.orientation = Orientation::Inverted;
        let mut trim = TrimCell(200);
        let inverted = run(&config, &inputs, &mut trim);

        assert_eq!(trim, TrimCell(-200 - inverted_neutral as i16));
        assert_eq!(inverted.command, -normal.command - inverted_neutral / 2);
    }

    #[test]
    fn test_inverted_without_capability_keeps_trim() {
        let config = config_with_gain(2.0);
        let mut inputs = stabilized_inputs();
        inputs.attitude = attitude(0, 1000, RMAX);
        inputs.flags.orientation = Orientation::Inverted;
        inputs.flags.can_stabilize_inverted = false;

        let mut trim = TrimCell(200);
        assert_eq!(run(&config, &inputs, &mut trim).command, 600);
        assert_eq!(trim, TrimCell(200));
    }

    #[test]
    fn test_failsafe_kick() {
        let mut config = config_with_gain(2.0);
        config.rtl_pitch_down_deg = 5.0;
        let kick = deg_to_rmat(5.0) as i16;
        assert_eq!(kick, 1429);

        for (radio_on, gps_steering) in [(false, true), (false, false), (true, true), (true, false)] {
            let mut inputs = stabilized_inputs();
            inputs.flags.radio_on = radio_on;
            inputs.flags.gps_steering = gps_steering;
            let out = run(&config, &inputs, &mut TrimCell(0));

            assert_eq!(out.failsafe, !radio_on && gps_steering);
            if !radio_on && gps_steering {
                assert_eq!(out.rtl_kick, kick);
                // -1429 / 2 с округлением вниз
                assert_eq!(out.command, -715);
            } else {
                assert_eq!(out.rtl_kick, 0);
                assert_eq!(out.command, 0);
            }
        }
    }

    #[test]
    fn test_pitch_rate_estimate() {
        let config = FlightConfig::default();
        let mut inputs = stabilized_inputs();
        inputs.rates = AngularRate::new(100, 0, 0);
        assert_eq!(run(&config, &inputs, &mut TrimCell(0)).pitch_rate, 50);

        inputs.attitude = attitude(RMAX, 0, 0);
        inputs.rates = AngularRate::new(0, 0, 100);
        let out = run(&config, &inputs, &mut TrimCell(0));
        assert_eq!(out.pitch_rate, -50);
    }

    #[test]
    fn test_derivative_term() {
        let config = FlightConfig {
            gains: PitchGainsConfig {
                pitch_gain: 0.0,
                roll_elev_mix: 0.0,
                ..PitchGainsConfig::default()
            },
            ..FlightConfig::default()
        };
        let mut inputs = stabilized_inputs();
        inputs.rates = AngularRate::new(100, 0, 0);

        // pitch_kd = 1967, скорость 50: 98350 >> 16 = 1
        assert_eq!(run(&config, &inputs, &mut TrimCell(0)).command, 1);
    }

    #[test]
    fn test_turn_coordination_mix() {
        let config = FlightConfig {
            gains: PitchGainsConfig {
                pitch_gain: 0.0,
                pitch_kd: 0.0,
                roll_elev_mix: 1.0,
                ..PitchGainsConfig::default()
            },
            ..FlightConfig::default()
        };
        let mut inputs = stabilized_inputs();
        inputs.attitude = attitude(8192, 0, RMAX);

        // Только крен: ((8192 × 16384) << 1) -> 4096, (4096 × 8192) >> 3 -> 64
        let out = run(&config, &inputs, &mut TrimCell(0));
        assert_eq!(out.nav_elev_mix, 64);
        assert_eq!(out.command, 64);

        // Руль направления отклонен на 100 от триммера
        inputs.radio.pw_out[3] = 2900;
        let out = run(&config, &inputs, &mut TrimCell(0));
        assert_eq!(out.nav_elev_mix, 64 + 9);

        let mut reversed = config;
        reversed.channels.rudder_reversed = true;
        let out = run(&reversed, &inputs, &mut TrimCell(0));
        assert_eq!(out.nav_elev_mix, 64 - 10);

        let mut no_rudder = config;
        no_rudder.channels.rudder_input = None;
        let out = run(&no_rudder, &inputs, &mut TrimCell(0));
        assert_eq!(out.nav_elev_mix, 64);
    }

    #[test]
    fn test_mix_requires_pitch_feedback() {
        let mut config = FlightConfig::default();
        config.gains.roll_elev_mix = 1.0;
        let mut inputs = stabilized_inputs();
        inputs.attitude = attitude(8192, 1000, RMAX);
        inputs.flags.pitch_feedback = false;

        let out = run(&config, &inputs, &mut TrimCell(0));
        assert_eq!(out.nav_elev_mix, 0);
        assert_eq!(out.command, 0);
    }

    #[test]
    fn test_stabilization_disabled_keeps_mix() {
        let mut config = FlightConfig::default();
        config.gains.roll_elev_mix = 1.0;
        config.pitch_stabilization = false;
        let mut inputs = stabilized_inputs();
        inputs.attitude = attitude(8192, 1000, RMAX);

        let out = run(&config, &inputs, &mut TrimCell(0));
        assert_eq!(out.nav_elev_mix, 64);
        assert_eq!(out.command, 64);
    }

    #[test]
    fn test_glide_adjust_only_when_enabled() {
        let mut config = config_with_gain(2.0);
        let mut inputs = stabilized_inputs();
        inputs.glide_pitch_adjust = Some(400);

        assert_eq!(run(&config, &inputs, &mut TrimCell(0)).command, 0);

        config.glide_airspeed_control = true;
        assert_eq!(run(&config, &inputs, &mut TrimCell(0)).command, 200);

        inputs.glide_pitch_adjust = None;
        assert_eq!(run(&config, &inputs, &mut TrimCell(0)).command, 0);
    }

    #[test]
    fn test_gains_override() {
        let mut config = config_with_gain(2.0);
        config.rtl_pitch_down_deg = 5.0;
        let mut inputs = PitchInputs::default();
        inputs.attitude = attitude(0, 1000, RMAX);
        inputs.flags.pitch_feedback = false;
        inputs.flags.gps_steering = true;

        assert_eq!(run(&config, &inputs, &mut TrimCell(0)).command, 0);

        config.test_gains = true;
        let out = run(&config, &inputs, &mut TrimCell(0));
        assert_eq!(out.rtl_kick, 0);
        assert_eq!(out.command, 500);
    }

    #[test]
    fn test_overflow_policy_on_error_sum() {
        let mut config = config_with_gain(2.0);
        let mut inputs = stabilized_inputs();
        inputs.attitude = attitude(0, 30_000, RMAX);

        // 30000 + 10000 не помещается в 16 бит
        config.overflow = OverflowPolicy::Wrapping;
        assert_eq!(run(&config, &inputs, &mut TrimCell(10_000)).command, -12_768);

        config.overflow = OverflowPolicy::Saturating;
        assert_eq!(run(&config, &inputs, &mut TrimCell(10_000)).command, 16_383);
    }

    #[test]
    fn test_failsafe_flag_without_kick() {
        // По умолчанию опускание носа 0°: признак есть, команда не меняется
        let config = config_with_gain(2.0);
        let mut inputs = stabilized_inputs();
        inputs.flags.gps_steering = true;

        let out = run(&config, &inputs, &mut TrimCell(0));
        assert!(out.failsafe);
        assert_eq!(out.rtl_kick, 0);
        assert_eq!(out.command, 0);
    }

    #[test]
    fn test_out_of_range_inverted_neutral_follows_policy() {
        let mut config = config_with_gain(2.0);
        config.inverted_neutral_pitch_deg = 1.0e9;
        let mut inputs = stabilized_inputs();
        inputs.flags.can_stabilize_inverted = true;
        inputs.flags.orientation = Orientation::Inverted;

        // Угол насыщается до 32767, поправка -200 - 32767 до -32768
        let mut trim = TrimCell(200);
        let out = run(&config, &inputs, &mut trim);
        assert_eq!(trim, TrimCell(i16::MIN));
        assert_eq!(out.command, -16_384);

        // При переносе i32::MAX дает младшее слово -1: -200 + 1
        config.overflow = OverflowPolicy::Wrapping;
        let mut trim = TrimCell(200);
        run(&config, &inputs, &mut trim);
        assert_eq!(trim, TrimCell(-199));
    }

    #[test]
    fn test_inverted_symmetry_within_rounding() {
        let config = FlightConfig::default();
        let gains = ControlGains::load(&config.gains);
        let inverted_neutral = deg_to_rmat(config.inverted_neutral_pitch_deg);

        let mut inputs = stabilized_inputs();
        inputs.attitude = attitude(3000, 1000, 16_000);
        inputs.rates = AngularRate::new(777, 0, -321);
        inputs.flags.can_stabilize_inverted = true;
        let normal = run(&config, &inputs, &mut TrimCell(0));

        inputs.flags.orientation = Orientation::Inverted;
        let inverted = run(&config, &inputs, &mut TrimCell(0));

        assert_eq!(normal.command, 37);
        assert_eq!(inverted.command, -96);
        assert_eq!((normal.pitch_rate, inverted.pitch_rate), (408, -409));
        assert_eq!((normal.nav_elev_mix, inverted.nav_elev_mix), (0, -1));

        // Старшее слово округляется вниз в каждом произведении, поэтому
        // зеркальная команда отличается от точной не более чем на два кванта
        let mirrored = -normal.command - ((inverted_neutral * gains.pitch_gain as i32) >> 16);
        assert_eq!(mirrored, -94);
        assert!((inverted.command - mirrored).abs() <= 2);
    }
}
