mod control_server;
mod file_channel;
mod helpers;
mod queue;
mod ws_channel;
