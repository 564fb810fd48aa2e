use crate::{
    chip8::Machine,
    devices::{DisplayCommands, KeyboardCommands},
    opcode::Operation,
    ProcessError,
};

/// Runs a single host tick: the key transitions are written into the machine,
/// one step is executed and the framebuffer is presented if it changed.
/// Key events with an invalid index are logged and dropped.
///
/// The caller decides when to tick (nominally every
/// [`cpu::INTERVAL`](crate::definitions::cpu::INTERVAL) milliseconds). On an error
/// nothing is presented, so the last valid frame stays on screen.
pub fn tick<D, K>(
    machine: &mut Machine,
    display: &mut D,
    keyboard: &mut K,
) -> Result<Operation, ProcessError>
where
    D: DisplayCommands,
    K: KeyboardCommands,
{
    for event in keyboard.poll() {
        if let Err(err) = machine.set_key(event.key, event.pressed) {
            log::warn!("dropping key event {:?}: {}", event, err);
        }
    }

    let operation = machine.step()?;

    if matches!(operation, Operation::Draw) {
        display.display(machine.framebuffer());
    }

    Ok(operation)
}
