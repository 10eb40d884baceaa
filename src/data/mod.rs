//! Данные одного такта цикла управления тангажом

use core::cell::Cell;

use nalgebra::{Matrix3, Vector3};

use crate::config::hardware::radio::NUM_CHANNELS;
use crate::config::hardware::RMAX;
use crate::control::mode::PitchMode;

/// Матрица направляющих косинусов (формат RMAX, 16-битное представление)
///
/// Законы управления переводят элементы в [`Fractional`](crate::utils::fixed::Fractional)
/// перед вычислениями.
///
/// Элементы нумеруются построчно: индексы 6, 7, 8 образуют третью строку,
/// связанную с вертикальной осью.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct AttitudeMatrix(pub Matrix3<i16>);

impl AttitudeMatrix {
    /// Построение из девяти элементов в построчном порядке
    pub fn from_row_major(m: [i16; 9]) -> Self {
        Self(Matrix3::new(
            m[0], m[1], m[2], //
            m[3], m[4], m[5], //
            m[6], m[7], m[8],
        ))
    }

    /// Горизонтальный полет
    pub fn level() -> Self {
        Self::from_row_major([RMAX, 0, 0, 0, RMAX, 0, 0, 0, RMAX])
    }

    /// Элемент по построчному индексу 0..9
    #[inline]
    pub fn rmat(&self, index: usize) -> i16 {
        self.0[(index / 3, index % 3)]
    }

    /// Третья строка матрицы
    #[inline]
    pub fn third_row(&self) -> [i16; 3] {
        [self.rmat(6), self.rmat(7), self.rmat(8)]
    }
}

impl Default for AttitudeMatrix {
    fn default() -> Self {
        Self::level()
    }
}

/// Угловые скорости в связанной системе (масштаб RMAX × SCALEGYRO)
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct AngularRate(pub Vector3<i16>);

impl AngularRate {
    pub fn new(roll: i16, pitch: i16, yaw: i16) -> Self {
        Self(Vector3::new(roll, pitch, yaw))
    }

    #[inline]
    pub fn roll(&self) -> i16 {
        self.0.x
    }

    #[inline]
    pub fn pitch(&self) -> i16 {
        self.0.y
    }

    #[inline]
    pub fn yaw(&self) -> i16 {
        self.0.z
    }
}

/// Положение аппарата
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Orientation {
    #[default]
    Normal,
    Inverted,
    Hover,
}

/// Флаги состояния полета на текущем такте
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct StateFlags {
    /// Обратная связь по тангажу включена
    pub pitch_feedback: bool,
    /// Навигация управляет аппаратом
    pub gps_steering: bool,
    /// Связь с передатчиком есть
    pub radio_on: bool,
    pub orientation: Orientation,
    /// Навигация допускает стабилизацию в перевернутом полете
    pub can_stabilize_inverted: bool,
    /// Навигация допускает стабилизацию висения
    pub can_stabilize_hover: bool,
    /// Поведение требует висения
    pub hover_desired: bool,
}

/// Длительности импульсов по каналам (полуединицы мкс)
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct RadioState {
    pub pw_in: [i16; NUM_CHANNELS],
    pub pw_out: [i16; NUM_CHANNELS],
    pub pw_trim: [i16; NUM_CHANNELS],
}

impl Default for RadioState {
    fn default() -> Self {
        Self {
            pw_in: [3000; NUM_CHANNELS],
            pw_out: [3000; NUM_CHANNELS],
            pw_trim: [3000; NUM_CHANNELS],
        }
    }
}

impl RadioState {
    /// Отклонение входа от триммера, 0 для незадействованного канала
    pub fn input_deflection(&self, channel: Option<usize>) -> i32 {
        match channel {
            Some(ch) if ch < NUM_CHANNELS => self.pw_in[ch] as i32 - self.pw_trim[ch] as i32,
            _ => 0,
        }
    }

    /// Триммер входного канала минус текущий выход
    pub fn trim_minus_output(&self, input: usize, output: usize) -> i32 {
        match (self.pw_trim.get(input), self.pw_out.get(output)) {
            (Some(&trim), Some(&out)) => trim as i32 - out as i32,
            _ => 0,
        }
    }
}

/// Навигационные данные
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct NavigationState {
    /// Расстояние до линии финиша текущего участка (метры)
    pub to_finish_line: i16,
}

/// Входы контура тангажа на один такт
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct PitchInputs {
    pub attitude: AttitudeMatrix,
    pub rates: AngularRate,
    pub flags: StateFlags,
    pub radio: RadioState,
    pub nav: NavigationState,
    /// Поправка тангажа от регулятора скорости планирования
    pub glide_pitch_adjust: Option<i16>,
}

/// Результат такта
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct PitchOutput {
    /// Команда тангажа для микшера
    pub command: i32,
    /// Оценка угловой скорости тангажа
    pub pitch_rate: i16,
    /// Вклад координации разворота
    pub nav_elev_mix: i16,
    /// Примененное опускание носа при потере связи
    pub rtl_kick: i16,
    /// Нет связи с передатчиком при навигационном управлении
    pub failsafe: bool,
    pub mode: PitchMode,
}

/// Поправка тангажа регулятора высоты, общая с контуром тангажа
///
/// Регулятор высоты записывает значение раньше контура тангажа в том же
/// такте. Контур тангажа перезаписывает его только в перевернутом полете.
pub trait AltitudeTrim {
    fn read_trim(&self) -> i16;
    fn write_trim(&mut self, value: i16);
}

/// Поправка высоты, хранимая по значению
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct TrimCell(pub i16);

impl AltitudeTrim for TrimCell {
    fn read_trim(&self) -> i16 {
        self.0
    }

    fn write_trim(&mut self, value: i16) {
        self.0 = value;
    }
}

impl AltitudeTrim for &Cell<i16> {
    fn read_trim(&self) -> i16 {
        self.get()
    }

    fn write_trim(&mut self, value: i16) {
        self.set(value);
    }
}

pub use shared::*;

mod shared {
    use core::cell::Cell;
    use core::sync::atomic::{AtomicU32, Ordering};

    use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
    use embassy_sync::blocking_mutex::Mutex;
    use embassy_sync::channel::Channel;
    use embassy_sync::signal::Signal;

    use super::{PitchInputs, PitchOutput};

    /// Размеры буферов каналов
    const INPUT_CHANNEL_SIZE: usize = 4;
    const OUTPUT_CHANNEL_SIZE: usize = 4;

    /// Каналы для передачи данных между задачами
    pub struct DataChannels {
        /// Входы такта от датчиков, приемника и навигации
        pub input_channel: Channel<CriticalSectionRawMutex, PitchInputs, INPUT_CHANNEL_SIZE>,
        /// Команды тангажа для микшера
        pub output_channel: Channel<CriticalSectionRawMutex, PitchOutput, OUTPUT_CHANNEL_SIZE>,
    }

    impl DataChannels {
        pub const fn new() -> Self {
            Self {
                input_channel: Channel::new(),
                output_channel: Channel::new(),
            }
        }
    }

    impl Default for DataChannels {
        fn default() -> Self {
            Self::new()
        }
    }

    /// Завершение этапа регулятора высоты в такте.
    ///
    /// Контур тангажа открывает такт номером, регулятор высоты сообщает
    /// номер такта, который он закончил. Сообщения прошлых тактов
    /// отбрасываются.
    pub struct AltitudeStage {
        tick: AtomicU32,
        done: Signal<CriticalSectionRawMutex, u32>,
    }

    impl AltitudeStage {
        pub const fn new() -> Self {
            Self {
                tick: AtomicU32::new(0),
                done: Signal::new(),
            }
        }

        /// Начало нового такта. Номер пишет только задача управления.
        pub fn begin_tick(&self) -> u32 {
            let tick = self.tick.load(Ordering::Relaxed).wrapping_add(1);
            self.tick.store(tick, Ordering::Relaxed);
            tick
        }

        /// Номер текущего такта для регулятора высоты
        pub fn current_tick(&self) -> u32 {
            self.tick.load(Ordering::Relaxed)
        }

        /// Регулятор высоты закончил такт `tick`
        pub fn complete(&self, tick: u32) {
            self.done.signal(tick);
        }

        /// Ожидание завершения такта `tick`
        pub async fn wait_for(&self, tick: u32) {
            while self.done.wait().await != tick {}
        }

        /// Такт `tick` уже завершен, без ожидания
        pub fn try_take(&self, tick: u32) -> bool {
            self.done.try_take() == Some(tick)
        }
    }

    impl Default for AltitudeStage {
        fn default() -> Self {
            Self::new()
        }
    }

    /// Состояние, разделяемое регулятором высоты и контуром тангажа
    pub struct SystemState {
        /// Поправка тангажа регулятора высоты
        pub altitude_trim: Mutex<CriticalSectionRawMutex, Cell<i16>>,
        pub altitude_stage: AltitudeStage,
    }

    impl SystemState {
        pub const fn new() -> Self {
            Self {
                altitude_trim: Mutex::new(Cell::new(0)),
                altitude_stage: AltitudeStage::new(),
            }
        }
    }

    impl Default for SystemState {
        fn default() -> Self {
            Self::new()
        }
    }

    // Статические экземпляры для глобального доступа
    pub static CHANNELS: DataChannels = DataChannels::new();
    pub static SYSTEM_STATE: SystemState = SystemState::new();
}
