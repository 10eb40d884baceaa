//! Математические функции и утилиты

/// Ограничение значения в заданных пределах
#[inline(always)]
pub fn constrain(value: f32, min: f32, max: f32) -> f32 {
    if value < min {
        min
    } else if value > max {
        max
    } else {
        value
    }
}

/// Ограничение целочисленного значения в заданных пределах
#[inline(always)]
pub fn constrain_i64(value: i64, min: i64, max: i64) -> i64 {
    if value < min {
        min
    } else if value > max {
        max
    } else {
        value
    }
}

/// Перевод градусов в единицы матрицы ориентации.
///
/// Используется коэффициент 57.3 градуса на радиан, а не точное 180/π.
/// Дробная часть отбрасывается (округление к нулю).
#[inline]
pub fn deg_to_rmat(deg: f32) -> i32 {
    (deg as f64 * (crate::config::hardware::RMAX as f64 / 57.3)) as i32
}

/// Округление до ближайшего целого с ограничением диапазоном `u16`
#[inline]
pub fn round_to_u16(value: f32) -> u16 {
    constrain(libm::roundf(value), 0.0, u16::MAX as f32) as u16
}
