mod connection_manager;
mod control_service;
mod handshake;
mod protocol;
