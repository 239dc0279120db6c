// Discord side of the message log: `stalk`, delete/DM/member reactors and their embeds.

pub mod commands;
pub mod events;
pub mod formatter;
