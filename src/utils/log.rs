//! Макросы логирования
//!
//! На борту сообщения уходят в `defmt` (транспорт RTT), в хостовых тестах
//! печатаются через `println!`, в остальных сборках вырезаются.

/// Информационное сообщение
#[macro_export]
macro_rules! log_info {
    ($($arg:tt)*) => {{
        #[cfg(all(feature = "defmt", not(test)))]
        ::defmt::info!($($arg)*);

        #[cfg(test)]
        println!("[INFO] {}", format!($($arg)*));

        #[cfg(all(not(feature = "defmt"), not(test)))]
        if false {
            let _ = ::core::format_args!($($arg)*);
        }
    }};
}

/// Предупреждение
#[macro_export]
macro_rules! log_warn {
    ($($arg:tt)*) => {{
        #[cfg(all(feature = "defmt", not(test)))]
        ::defmt::warn!($($arg)*);

        #[cfg(test)]
        println!("[WARN] {}", format!($($arg)*));

        #[cfg(all(not(feature = "defmt"), not(test)))]
        if false {
            let _ = ::core::format_args!($($arg)*);
        }
    }};
}

/// Ошибка
#[macro_export]
macro_rules! log_error {
    ($($arg:tt)*) => {{
        #[cfg(all(feature = "defmt", not(test)))]
        ::defmt::error!($($arg)*);

        #[cfg(test)]
        println!("[ERROR] {}", format!($($arg)*));

        #[cfg(all(not(feature = "defmt"), not(test)))]
        if false {
            let _ = ::core::format_args!($($arg)*);
        }
    }};
}

/// Отладочное сообщение
#[macro_export]
macro_rules! log_debug {
    ($($arg:tt)*) => {{
        #[cfg(all(feature = "defmt", not(test)))]
        ::defmt::debug!($($arg)*);

        #[cfg(test)]
        println!("[DEBUG] {}", format!($($arg)*));

        #[cfg(all(not(feature = "defmt"), not(test)))]
        if false {
            let _ = ::core::format_args!($($arg)*);
        }
    }};
}
