// src/tasks/control_task.rs
use embassy_time::{with_timeout, Duration, Ticker};

use crate::config::hardware::CONTROL_RATE_HZ;
use crate::control::PitchController;
use crate::data::{PitchInputs, CHANNELS, SYSTEM_STATE};

/// Такт цикла управления тангажом.
///
/// Задача открывает такт, регулятор высоты обновляет поправку тангажа и
/// сообщает номер законченного такта, после чего контур тангажа считает
/// команду и отправляет ее микшеру.
#[embassy_executor::task]
pub async fn task(mut controller: PitchController) {
    let input_receiver = CHANNELS.input_channel.receiver();
    let output_sender = CHANNELS.output_channel.sender();

    // Ожидание регулятора высоты не дольше половины периода
    let altitude_timeout = Duration::from_hz(CONTROL_RATE_HZ * 2);

    let mut altitude_late = false;
    let mut inputs = PitchInputs::default();
    let mut ticker = Ticker::every(Duration::from_hz(CONTROL_RATE_HZ));
    loop {
        ticker.next().await;

        let stage = &SYSTEM_STATE.altitude_stage;
        let tick = stage.begin_tick();
        let late = with_timeout(altitude_timeout, stage.wait_for(tick))
            .await
            .is_err();
        if late && !altitude_late {
            log_warn!("Регулятор высоты не успел, используется прежняя поправка");
        } else if !late && altitude_late {
            log_info!("Регулятор высоты снова в такте");
        }
        altitude_late = late;

        // Берем самые свежие входы, без новых данных остаются прежние
        while let Ok(next) = input_receiver.try_receive() {
            inputs = next;
        }

        let output = SYSTEM_STATE.altitude_trim.lock(|cell| {
            let mut trim = cell;
            controller.update(&inputs, &mut trim)
        });

        if output_sender.try_send(output).is_err() {
            log_warn!("Буфер команд тангажа переполнен");
        }
    }
}
