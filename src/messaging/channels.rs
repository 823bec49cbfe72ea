// Lock-free notification channel (cpal callbacks -> output context owner)

use crate::messaging::notification::Notification;
use ringbuf::traits::{Consumer, Producer, Split};
use ringbuf::HeapRb;

pub type NotificationProducer = ringbuf::HeapProd<Notification>;
pub type NotificationConsumer = ringbuf::HeapCons<Notification>;

pub fn create_notification_channel(
    capacity: usize,
) -> (NotificationProducer, NotificationConsumer) {
    let rb = HeapRb::<Notification>::new(capacity);
    rb.split()
}

/// Push without blocking. A full channel drops the notification and
/// returns false.
pub fn try_notify(tx: &mut NotificationProducer, notification: Notification) -> bool {
    tx.try_push(notification).is_ok()
}

/// Take everything currently queued
pub fn drain(rx: &mut NotificationConsumer) -> Vec<Notification> {
    let mut drained = Vec::new();
    while let Some(notification) = rx.try_pop() {
        drained.push(notification);
    }
    drained
}
