//! Конфигурация аппаратного обеспечения автопилота

/// Единица в формате матрицы ориентации (2^14)
pub const RMAX: i16 = 16384;

/// Масштаб гироскопа платы: угловая скорость в единицах RMAX × SCALEGYRO
pub const SCALEGYRO: f32 = 3.0016;

/// Масштаб пропорциональных коэффициентов и коэффициентов смешивания
pub const GAIN_SCALE: f32 = RMAX as f32;

/// Масштаб дифференциальных коэффициентов (масштаб угла × масштаб гироскопа)
pub const KD_GAIN_SCALE: f32 = SCALEGYRO * RMAX as f32;

/// Частота цикла управления (Гц)
pub const CONTROL_RATE_HZ: u64 = 40;

/// Конфигурация радиоканалов
pub mod radio {
    /// Количество каналов приёмника и выходов
    pub const NUM_CHANNELS: usize = 8;

    /// Перевод отклонения ручки (полуединицы мкс) в единицы RMAX
    pub const STICK_TO_RMAX: i16 = super::RMAX / 600;

    /// Назначение каналов, используемых контуром тангажа
    ///
    /// `None` означает, что канал не задействован.
    #[derive(Clone, Copy, Debug, PartialEq, Eq)]
    #[cfg_attr(feature = "defmt", derive(defmt::Format))]
    pub struct RadioChannelMap {
        /// Вход руля высоты
        pub elevator_input: Option<usize>,
        /// Инверсия руля высоты
        pub elevator_reversed: bool,
        /// Вход руля направления
        pub rudder_input: Option<usize>,
        /// Выход руля направления
        pub rudder_output: Option<usize>,
        /// Инверсия руля направления
        pub rudder_reversed: bool,
    }

    impl Default for RadioChannelMap {
        fn default() -> Self {
            Self {
                elevator_input: Some(1),  // CH2
                elevator_reversed: false,
                rudder_input: Some(4),    // CH5
                rudder_output: Some(3),   // CH4
                rudder_reversed: false,
            }
        }
    }

    impl RadioChannelMap {
        /// Оба канала руля направления назначены
        pub fn rudder_configured(&self) -> bool {
            self.rudder_input.is_some() && self.rudder_output.is_some()
        }

        /// Все назначенные каналы
        pub fn assigned(&self) -> [Option<usize>; 3] {
            [self.elevator_input, self.rudder_input, self.rudder_output]
        }
    }
}
