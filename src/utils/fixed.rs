//! Арифметика с фиксированной точкой
//!
//! Геометрические величины имеют формат Q1.14: [`RMAX`](crate::config::hardware::RMAX)
//! соответствует единице. Внутри законов управления они представлены типом
//! [`Fractional`], который несет политику переполнения, поэтому 16-битные
//! сложение, вычитание и смена знака всегда выполняются по ней. Угловые
//! скорости имеют собственный масштаб: масштаб угла, умноженный на
//! коэффициент гироскопа. Произведения считаются в 32 битах, результатом
//! служит старшее слово после сдвига, указанного в месте вызова.

use core::fmt;
use core::ops::{Add, Neg, Sub};

use ::fixed::types::I2F14;
use num_traits::AsPrimitive;

use crate::utils::math::constrain_i64;

/// Поведение при выходе результата за разрядную сетку
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum OverflowPolicy {
    /// Перенос по модулю разрядности, как на 16-битном DSP
    Wrapping,
    /// Насыщение до границ типа
    #[default]
    Saturating,
}

/// Дробное число Q1.14 с политикой переполнения.
///
/// Результат бинарной операции получает политику левого операнда.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Fractional {
    value: I2F14,
    policy: OverflowPolicy,
}

impl Fractional {
    /// Значение из 16-битного представления (единица = RMAX)
    pub const fn from_raw(raw: i16, policy: OverflowPolicy) -> Self {
        Self {
            value: I2F14::from_bits(raw),
            policy,
        }
    }

    /// Приведение 32-битного значения к Q1.14 по политике
    pub fn from_wide(value: i32, policy: OverflowPolicy) -> Self {
        let raw = match policy {
            OverflowPolicy::Wrapping => value.as_(),
            OverflowPolicy::Saturating => {
                constrain_i64(value as i64, i16::MIN as i64, i16::MAX as i64) as i16
            }
        };
        Self::from_raw(raw, policy)
    }

    /// 16-битное представление
    #[inline]
    pub const fn raw(self) -> i16 {
        self.value.to_bits()
    }

    /// Расширение до 32 бит для накопления
    #[inline]
    pub const fn wide(self) -> i32 {
        self.raw() as i32
    }

    #[inline]
    pub const fn value(self) -> I2F14 {
        self.value
    }

    #[inline]
    pub const fn policy(self) -> OverflowPolicy {
        self.policy
    }
}

impl Add for Fractional {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        let value = match self.policy {
            OverflowPolicy::Wrapping => self.value.wrapping_add(rhs.value),
            OverflowPolicy::Saturating => self.value.saturating_add(rhs.value),
        };
        Self { value, ..self }
    }
}

impl Sub for Fractional {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self {
        let value = match self.policy {
            OverflowPolicy::Wrapping => self.value.wrapping_sub(rhs.value),
            OverflowPolicy::Saturating => self.value.saturating_sub(rhs.value),
        };
        Self { value, ..self }
    }
}

impl Neg for Fractional {
    type Output = Self;

    fn neg(self) -> Self {
        let value = match self.policy {
            OverflowPolicy::Wrapping => self.value.wrapping_neg(),
            OverflowPolicy::Saturating => self.value.saturating_neg(),
        };
        Self { value, ..self }
    }
}

impl fmt::Display for Fractional {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.value)
    }
}

#[cfg(feature = "defmt")]
impl defmt::Format for Fractional {
    fn format(&self, fmt: defmt::Formatter) {
        defmt::write!(fmt, "{}/16384", self.raw())
    }
}

/// Масштабирующий сдвиг 32-битного произведения перед взятием старшего слова
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Shift {
    None,
    Left(u32),
    Right(u32),
}

/// Вычислитель 32-битных аккумуляторов с заданной политикой переполнения
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Fixed {
    policy: OverflowPolicy,
}

impl Fixed {
    pub const fn new(policy: OverflowPolicy) -> Self {
        Self { policy }
    }

    pub const fn policy(&self) -> OverflowPolicy {
        self.policy
    }

    /// Величина Q1.14 с политикой вычислителя
    #[inline]
    pub const fn frac(&self, raw: i16) -> Fractional {
        Fractional::from_raw(raw, self.policy)
    }

    /// Знаковое произведение 16×16 → 32. Переполнение невозможно.
    #[inline]
    pub fn mul_ss(a: i16, b: i16) -> i32 {
        a as i32 * b as i32
    }

    /// Знаковое × беззнаковое 16×16 → 32.
    ///
    /// Наибольший модуль результата |-32768 × 65535| меньше 2^31.
    #[inline]
    pub fn mul_su(a: i16, b: u16) -> i32 {
        a as i32 * b as i32
    }

    /// Беззнаковое × знаковое 16×16 → 32
    #[inline]
    pub fn mul_us(a: u16, b: i16) -> i32 {
        Self::mul_su(b, a)
    }

    /// Старшее слово 32-битного аккумулятора (округление вниз)
    #[inline]
    pub fn high_word(acc: i32) -> i16 {
        (acc >> 16) as i16
    }

    /// Сдвиг аккумулятора влево с учётом политики
    #[inline]
    pub fn shl(&self, acc: i32, n: u32) -> i32 {
        self.fit_i32((acc as i64) << n)
    }

    /// Арифметический сдвиг вправо
    #[inline]
    pub fn shr(&self, acc: i32, n: u32) -> i32 {
        acc >> n
    }

    /// Сложение аккумуляторов
    #[inline]
    pub fn add_wide(&self, a: i32, b: i32) -> i32 {
        self.fit_i32(a as i64 + b as i64)
    }

    /// Вычитание аккумуляторов
    #[inline]
    pub fn sub_wide(&self, a: i32, b: i32) -> i32 {
        self.fit_i32(a as i64 - b as i64)
    }

    /// Приведение 32-битного значения к Q1.14
    #[inline]
    pub fn narrow(&self, value: i32) -> Fractional {
        Fractional::from_wide(value, self.policy)
    }

    /// Масштабированное произведение Q1.14 на беззнаковый коэффициент
    pub fn scaled_mul_su(&self, a: Fractional, b: u16, shift: Shift) -> Fractional {
        self.frac(Self::high_word(self.rescale(Self::mul_su(a.raw(), b), shift)))
    }

    /// Масштабированное произведение двух величин Q1.14
    pub fn scaled_mul_ss(&self, a: Fractional, b: Fractional, shift: Shift) -> Fractional {
        self.frac(Self::high_word(self.rescale(Self::mul_ss(a.raw(), b.raw()), shift)))
    }

    fn rescale(&self, acc: i32, shift: Shift) -> i32 {
        match shift {
            Shift::None => acc,
            Shift::Left(n) => self.shl(acc, n),
            Shift::Right(n) => self.shr(acc, n),
        }
    }

    fn fit_i32(&self, value: i64) -> i32 {
        match self.policy {
            OverflowPolicy::Wrapping => value.as_(),
            OverflowPolicy::Saturating => {
                constrain_i64(value, i32::MIN as i64, i32::MAX as i64) as i32
            }
        }
    }
}
