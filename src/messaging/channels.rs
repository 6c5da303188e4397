// Communication channels lock-free

use crate::messaging::command::EditCommand;
use ringbuf::{HeapRb, traits::Split};

pub type CommandProducer = ringbuf::HeapProd<EditCommand>;
pub type CommandConsumer = ringbuf::HeapCons<EditCommand>;

/// Queue of edit commands from the UI to the engine owner
pub fn create_command_channel(capacity: usize) -> (CommandProducer, CommandConsumer) {
    let rb = HeapRb::<EditCommand>::new(capacity.max(1));
    rb.split()
}

#[cfg(test)]
mod tests {
    use super::*;
    use ringbuf::traits::{Consumer, Producer};

    #[test]
    fn test_command_channel_fifo() {
        let (mut tx, mut rx) = create_command_channel(4);
        tx.try_push(EditCommand::SelectTrack(2)).unwrap();
        tx.try_push(EditCommand::ToggleStepActive).unwrap();
        assert_eq!(rx.try_pop(), Some(EditCommand::SelectTrack(2)));
        assert_eq!(rx.try_pop(), Some(EditCommand::ToggleStepActive));
        assert_eq!(rx.try_pop(), None);
    }

    #[test]
    fn test_command_channel_full() {
        let (mut tx, _rx) = create_command_channel(1);
        assert!(tx.try_push(EditCommand::Paste).is_ok());
        assert!(tx.try_push(EditCommand::Paste).is_err());
    }
}
