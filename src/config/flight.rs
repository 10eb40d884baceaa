//! Конфигурация параметров полета и коэффициентов контура тангажа

use core::fmt;

use crate::config::hardware::radio::{RadioChannelMap, NUM_CHANNELS};
use crate::config::hardware::{GAIN_SCALE, KD_GAIN_SCALE};
use crate::utils::fixed::OverflowPolicy;

/// Коэффициенты тангажа в самолетном режиме
pub mod pitch {
    pub const GAIN: f32 = 0.10; // Пропорциональный коэффициент
    pub const KD: f32 = 0.04; // Дифференциальный коэффициент
    pub const RUDDER_ELEV_MIX: f32 = 0.20; // Смешивание руль направления -> руль высоты
    pub const ROLL_ELEV_MIX: f32 = 0.05; // Смешивание крен -> руль высоты
}

/// Параметры режима висения
pub mod hover {
    pub const GAIN: f32 = 0.2;
    pub const KD: f32 = 0.25;

    /// Смещение тангажа при висении (градусы)
    pub const PITCH_OFFSET_DEG: f32 = 0.0;

    /// Наклон в сторону путевой точки на большом удалении (градусы)
    pub const PITCH_TOWARDS_WP_DEG: f32 = 30.0;

    /// Расстояние, начиная с которого наклон к точке максимален (метры)
    pub const NAV_MAX_PITCH_RADIUS: i16 = 20;
}

/// Параметры безопасности полета
pub mod safety {
    /// Опускание носа при потере связи в автоматическом режиме (градусы)
    pub const RTL_PITCH_DOWN_DEG: f32 = 0.0;
}

/// Параметры перевернутого полета
pub mod inverted {
    /// Нейтральный тангаж в перевернутом полете (градусы)
    pub const NEUTRAL_PITCH_DEG: f32 = 8.0;
}

/// Наибольший допустимый модуль угловой уставки (градусы)
pub const MAX_ANGLE_DEG: f32 = 90.0;

/// Порядок вычисления наклона к путевой точке внутри радиуса
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum RampOrder {
    /// `max / radius * distance`, деление выполняется первым
    #[default]
    DivideFirst,
    /// `max * distance / radius`, без потери точности при малом радиусе
    MultiplyFirst,
}

/// Настраиваемые коэффициенты контура тангажа в плавающей точке
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct PitchGainsConfig {
    pub pitch_gain: f32,
    pub pitch_kd: f32,
    pub hover_pitch_gain: f32,
    pub hover_pitch_kd: f32,
    pub rudder_elev_mix: f32,
    pub roll_elev_mix: f32,
}

impl Default for PitchGainsConfig {
    fn default() -> Self {
        Self {
            pitch_gain: pitch::GAIN,
            pitch_kd: pitch::KD,
            hover_pitch_gain: hover::GAIN,
            hover_pitch_kd: hover::KD,
            rudder_elev_mix: pitch::RUDDER_ELEV_MIX,
            roll_elev_mix: pitch::ROLL_ELEV_MIX,
        }
    }
}

impl PitchGainsConfig {
    /// Имя, значение и масштаб каждого коэффициента
    fn entries(&self) -> [(&'static str, f32, f32); 6] {
        [
            ("pitch_gain", self.pitch_gain, GAIN_SCALE),
            ("pitch_kd", self.pitch_kd, KD_GAIN_SCALE),
            ("hover_pitch_gain", self.hover_pitch_gain, GAIN_SCALE),
            ("hover_pitch_kd", self.hover_pitch_kd, KD_GAIN_SCALE),
            ("rudder_elev_mix", self.rudder_elev_mix, GAIN_SCALE),
            ("roll_elev_mix", self.roll_elev_mix, GAIN_SCALE),
        ]
    }
}

/// Конфигурация контура тангажа
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct FlightConfig {
    pub gains: PitchGainsConfig,
    /// Опускание носа при потере связи (градусы)
    pub rtl_pitch_down_deg: f32,
    /// Нейтральный тангаж в перевернутом полете (градусы)
    pub inverted_neutral_pitch_deg: f32,
    /// Смещение тангажа при висении (градусы)
    pub hover_pitch_offset_deg: f32,
    /// Максимальный наклон к путевой точке при висении (градусы)
    pub hover_pitch_towards_wp_deg: f32,
    /// Радиус максимального наклона к путевой точке
    pub hover_nav_max_pitch_radius: i16,
    pub hover_ramp_order: RampOrder,
    /// Стабилизация тангажа разрешена
    pub pitch_stabilization: bool,
    /// Поправка тангажа от регулятора воздушной скорости планирования
    pub glide_airspeed_control: bool,
    /// Режим настройки коэффициентов: навигация выключена, стабилизация включена
    pub test_gains: bool,
    /// Поведение арифметики при переполнении
    pub overflow: OverflowPolicy,
    pub channels: RadioChannelMap,
}

impl Default for FlightConfig {
    fn default() -> Self {
        Self {
            gains: PitchGainsConfig::default(),
            rtl_pitch_down_deg: safety::RTL_PITCH_DOWN_DEG,
            inverted_neutral_pitch_deg: inverted::NEUTRAL_PITCH_DEG,
            hover_pitch_offset_deg: hover::PITCH_OFFSET_DEG,
            hover_pitch_towards_wp_deg: hover::PITCH_TOWARDS_WP_DEG,
            hover_nav_max_pitch_radius: hover::NAV_MAX_PITCH_RADIUS,
            hover_ramp_order: RampOrder::DivideFirst,
            pitch_stabilization: true,
            glide_airspeed_control: false,
            test_gains: false,
            overflow: OverflowPolicy::Saturating,
            channels: RadioChannelMap::default(),
        }
    }
}

impl FlightConfig {
    /// Проверка конфигурации перед запуском цикла управления
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.hover_nav_max_pitch_radius <= 0 {
            return Err(ConfigError::InvalidNavRadius(self.hover_nav_max_pitch_radius));
        }

        for (gain, value, scale) in self.gains.entries() {
            if !value.is_finite() || value < 0.0 || value * scale > u16::MAX as f32 {
                return Err(ConfigError::GainOutOfRange { gain, value });
            }
        }

        let angles = [
            ("rtl_pitch_down_deg", self.rtl_pitch_down_deg),
            ("inverted_neutral_pitch_deg", self.inverted_neutral_pitch_deg),
            ("hover_pitch_offset_deg", self.hover_pitch_offset_deg),
            ("hover_pitch_towards_wp_deg", self.hover_pitch_towards_wp_deg),
        ];
        for (angle, value) in angles {
            if !value.is_finite() || value.abs() > MAX_ANGLE_DEG {
                return Err(ConfigError::InvalidAngle { angle, value });
            }
        }

        for channel in self.channels.assigned().into_iter().flatten() {
            if channel >= NUM_CHANNELS {
                return Err(ConfigError::ChannelOutOfRange { channel });
            }
        }

        Ok(())
    }
}

/// Ошибки конфигурации контура тангажа
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum ConfigError {
    /// Радиус наклона к путевой точке должен быть положительным
    InvalidNavRadius(i16),
    /// Коэффициент отрицательный или не помещается в 16 бит
    GainOutOfRange { gain: &'static str, value: f32 },
    /// Угловая уставка вне допустимого диапазона
    InvalidAngle { angle: &'static str, value: f32 },
    /// Номер канала больше числа каналов
    ChannelOutOfRange { channel: usize },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::InvalidNavRadius(r) => {
                write!(f, "hover nav radius must be positive, got {}", r)
            }
            ConfigError::GainOutOfRange { gain, value } => {
                write!(f, "gain {} out of range: {}", gain, value)
            }
            ConfigError::InvalidAngle { angle, value } => {
                write!(f, "angle {} out of range: {}", angle, value)
            }
            ConfigError::ChannelOutOfRange { channel } => {
                write!(f, "radio channel {} out of range", channel)
            }
        }
    }
}

#[cfg(feature = "defmt")]
impl defmt::Format for ConfigError {
    fn format(&self, fmt: defmt::Formatter) {
        match self {
            ConfigError::InvalidNavRadius(r) => {
                defmt::write!(fmt, "Config: hover nav radius must be positive, got {}", r)
            }
            ConfigError::GainOutOfRange { gain, value } => {
                defmt::write!(fmt, "Config: gain {} out of range: {}", gain, value)
            }
            ConfigError::InvalidAngle { angle, value } => {
                defmt::write!(fmt, "Config: angle {} out of range: {}", angle, value)
            }
            ConfigError::ChannelOutOfRange { channel } => {
                defmt::write!(fmt, "Config: radio channel {} out of range", channel)
            }
        }
    }
}
