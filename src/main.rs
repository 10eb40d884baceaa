#![no_std]
#![no_main]

use embassy_executor::Spawner;
use embassy_rp::gpio::{Level, Output};
use embassy_time::{Duration, Timer};
use {defmt_rtt as _, panic_probe as _};

use vtol_pitch_autopilot::config::flight::FlightConfig;
use vtol_pitch_autopilot::control::PitchController;
use vtol_pitch_autopilot::data::CHANNELS;
use vtol_pitch_autopilot::tasks::control_task;

/// Точка входа в программу
#[embassy_executor::main]
async fn main(spawner: Spawner) {
    // Инициализация HAL Raspberry Pi Pico
    let p = embassy_rp::init(Default::default());

    defmt::info!("=== Автопилот СВВП, контур тангажа v{} ===", env!("CARGO_PKG_VERSION"));
    defmt::info!("Инициализация системы...");

    // Светодиод индикации состояния
    let mut led = Output::new(p.PIN_25, Level::Low);

    let config = FlightConfig::default();
    let controller = match PitchController::new(&config) {
        Ok(controller) => controller,
        Err(e) => {
            defmt::error!("Контур тангажа не запущен: {}", e);
            // Частое мигание при ошибке конфигурации
            loop {
                led.toggle();
                Timer::after(Duration::from_millis(100)).await;
            }
        }
    };

    defmt::info!("Запуск задач...");
    if spawner.spawn(control_task::task(controller)).is_err() {
        defmt::error!("Не удалось запустить задачу управления");
    }

    defmt::info!("Система инициализирована");

    // Пока микшер не подключен, очередь команд разбирается здесь
    let output_receiver = CHANNELS.output_channel.receiver();
    let mut cycle: u32 = 0;
    loop {
        let mut last = None;
        while let Ok(output) = output_receiver.try_receive() {
            last = Some(output);
        }
        if let Some(output) = last {
            defmt::debug!("Тангаж: {}", output);
        }

        cycle = cycle.wrapping_add(1);
        if cycle % 10 == 0 {
            led.toggle();
        }
        Timer::after(Duration::from_millis(50)).await;
    }
}
