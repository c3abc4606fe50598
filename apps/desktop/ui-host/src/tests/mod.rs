mod browser;
mod consumer;
