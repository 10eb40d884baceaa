//! Контроллер тангажа
//!
//! Хранит коэффициенты и оба закона управления, на каждом такте выбирает
//! закон и запоминает результат для чтения микшером и телеметрией.

use crate::config::flight::{ConfigError, FlightConfig, PitchGainsConfig};
use crate::control::forward::ForwardLaw;
use crate::control::gains::ControlGains;
use crate::control::hover::HoverLaw;
use crate::control::mode::PitchMode;
use crate::data::{AltitudeTrim, PitchInputs, PitchOutput};

/// Контроллер тангажа
pub struct PitchController {
    gains: ControlGains,
    forward: ForwardLaw,
    hover: HoverLaw,
    /// Результат последнего такта
    last: PitchOutput,
}

impl PitchController {
    /// Создание контроллера из проверенной конфигурации
    pub fn new(config: &FlightConfig) -> Result<Self, ConfigError> {
        if let Err(e) = config.validate() {
            log_error!("Ошибка конфигурации тангажа: {}", e);
            return Err(e);
        }

        let gains = ControlGains::load(&config.gains);
        log_debug!(
            "Коэффициенты тангажа: P={} D={} hover P={} D={} mix={}/{}",
            gains.pitch_gain,
            gains.pitch_kd,
            gains.hover_pitch_gain,
            gains.hover_pitch_kd,
            gains.rudder_elev_mix,
            gains.roll_elev_mix
        );

        let forward = ForwardLaw::new(config);
        log_debug!(
            "Опускание носа {} RMAX, руль направления назначен: {}",
            forward.rtl_kick().raw(),
            config.channels.rudder_configured()
        );
        log_info!("Контур тангажа настроен");

        Ok(Self {
            gains,
            forward,
            hover: HoverLaw::new(config),
            last: PitchOutput::default(),
        })
    }

    /// Один такт управления.
    ///
    /// Регулятор высоты должен обновить `trim` раньше в этом же такте.
    pub fn update<T: AltitudeTrim>(&mut self, inputs: &PitchInputs, trim: &mut T) -> PitchOutput {
        let mode = PitchMode::select(inputs.flags.can_stabilize_hover, inputs.flags.hover_desired);

        let output = match mode {
            PitchMode::Forward => self.forward.update(&self.gains, inputs, trim),
            PitchMode::Hover => self.hover.update(&self.gains, inputs),
        };

        if mode != self.last.mode {
            log_info!("Режим тангажа: {:?}", mode);
        }
        if output.failsafe && !self.last.failsafe {
            log_warn!("Нет связи при навигации: опускание носа {}", output.rtl_kick);
        } else if !output.failsafe && self.last.failsafe {
            log_info!("Связь восстановлена");
        }

        self.last = output;
        output
    }

    /// Результат последнего такта
    pub fn output(&self) -> &PitchOutput {
        &self.last
    }

    /// Команда тангажа для микшера
    pub fn command(&self) -> i32 {
        self.last.command
    }

    /// Оценка угловой скорости тангажа
    pub fn pitch_rate(&self) -> i16 {
        self.last.pitch_rate
    }

    /// Потеря связи при навигационном управлении на последнем такте
    pub fn failsafe_active(&self) -> bool {
        self.last.failsafe
    }

    /// Вклад координации разворота
    pub fn nav_elev_mix(&self) -> i16 {
        self.last.nav_elev_mix
    }

    pub fn gains(&self) -> &ControlGains {
        &self.gains
    }

    /// Загрузка новых коэффициентов (например, после настройки с земли)
    pub fn load_gains(&mut self, config: &PitchGainsConfig) {
        self.gains = ControlGains::load(config);
    }

    /// Коэффициенты для сохранения в конфигурации
    pub fn save_gains(&self) -> PitchGainsConfig {
        self.gains.save()
    }

    /// Запись текущих коэффициентов в конфигурацию
    pub fn save_config(&self, config: &mut FlightConfig) {
        config.gains = self.save_gains();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::TrimCell;

    #[test]
    fn test_controller_creation() {
        let controller = PitchController::new(&FlightConfig::default()).unwrap();
        assert_eq!(controller.command(), 0);
        assert_eq!(controller.pitch_rate(), 0);
        assert_eq!(controller.nav_elev_mix(), 0);
        assert_eq!(controller.output().mode, PitchMode::Forward);
    }

    #[test]
    fn test_invalid_radius_rejected() {
        let mut config = FlightConfig::default();
        config.hover_nav_max_pitch_radius = 0;
        assert_eq!(
            PitchController::new(&config).err(),
            Some(ConfigError::InvalidNavRadius(0))
        );
    }

    #[test]
    fn test_mode_dispatch() {
        let mut controller = PitchController::new(&FlightConfig::default()).unwrap();
        let mut inputs = PitchInputs::default();
        inputs.flags.pitch_feedback = true;
        let mut trim = TrimCell(0);

        inputs.flags.hover_desired = true;
        assert_eq!(controller.update(&inputs, &mut trim).mode, PitchMode::Forward);

        inputs.flags.can_stabilize_hover = true;
        assert_eq!(controller.update(&inputs, &mut trim).mode, PitchMode::Hover);
        assert_eq!(controller.output().mode, PitchMode::Hover);

        inputs.flags.hover_desired = false;
        assert_eq!(controller.update(&inputs, &mut trim).mode, PitchMode::Forward);
    }

    #[test]
    fn test_save_and_reload_gains() {
        let mut controller = PitchController::new(&FlightConfig::default()).unwrap();
        let before = *controller.gains();

        let mut config = FlightConfig::default();
        controller.save_config(&mut config);
        controller.load_gains(&config.gains);
        assert_eq!(*controller.gains(), before);
    }

    #[test]
    fn test_failsafe_tracked_with_zero_kick() {
        let config = FlightConfig::default();
        assert_eq!(config.rtl_pitch_down_deg, 0.0);
        let mut controller = PitchController::new(&config).unwrap();

        let mut inputs = PitchInputs::default();
        inputs.flags.pitch_feedback = true;
        inputs.flags.gps_steering = true;
        controller.update(&inputs, &mut TrimCell(0));
        assert!(controller.failsafe_active());
        assert_eq!(controller.output().rtl_kick, 0);

        inputs.flags.radio_on = true;
        controller.update(&inputs, &mut TrimCell(0));
        assert!(!controller.failsafe_active());

        // В режиме висения опускание носа не применяется
        inputs.flags.radio_on = false;
        inputs.flags.can_stabilize_hover = true;
        inputs.flags.hover_desired = true;
        controller.update(&inputs, &mut TrimCell(0));
        assert!(!controller.failsafe_active());
    }
}
