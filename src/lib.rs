#[macro_use]
extern crate serde_derive;
#[macro_use(Message, MessageResponse)]
extern crate actix_derive;
extern crate colored;

pub mod avalanche;
pub mod dot;
pub mod graph;
pub mod id;
pub mod network;
pub mod params;
pub mod simulation;

use id::NodeId;

#[derive(Debug)]
pub enum Error {
    IO(std::io::Error),
    Config(config::ConfigError),
    Actix(actix::MailboxError),

    // consensus errors
    Graph(graph::Error),
    Avalanche(avalanche::Error),

    // network errors
    /// No node with this id exists in the network
    UnknownNode(NodeId),
    /// A peer did not answer in time
    Timeout,

    /// Error caused by converting from a `String` to an `Id`
    TryFromStringError,
}

impl std::error::Error for Error {}

impl std::convert::From<std::io::Error> for Error {
    fn from(error: std::io::Error) -> Self {
        Error::IO(error)
    }
}

impl std::convert::From<config::ConfigError> for Error {
    fn from(error: config::ConfigError) -> Self {
        Error::Config(error)
    }
}

impl std::convert::From<actix::MailboxError> for Error {
    fn from(error: actix::MailboxError) -> Self {
        Error::Actix(error)
    }
}

impl std::convert::From<graph::Error> for Error {
    fn from(error: graph::Error) -> Self {
        Error::Graph(error)
    }
}

impl std::convert::From<avalanche::Error> for Error {
    fn from(error: avalanche::Error) -> Self {
        Error::Avalanche(error)
    }
}

impl std::convert::From<tokio::time::error::Elapsed> for Error {
    fn from(_: tokio::time::error::Elapsed) -> Self {
        Error::Timeout
    }
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "{:?}", self)
    }
}

pub type Result<T> = std::result::Result<T, Error>;
