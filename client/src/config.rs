/// Everything the client needs to bridge a GUI to a game server.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Name sent in every join request.
    pub player_name: String,
    /// UDP port the GUI sends its input to.
    pub port: u16,
    /// `host:port` of the GUI, which receives draw snapshots.
    pub gui_address: String,
    /// `host:port` of the game server.
    pub server_address: String,
}
