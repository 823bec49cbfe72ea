// Module messaging - Audio thread -> control thread notifications

pub mod channels;
pub mod notification;
