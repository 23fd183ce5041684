mod attachment;
mod falling;
mod plugin;
mod receive;
mod spawn;
