//! Events domain - wire frames, event names and typed payloads.

mod frame;
mod inbound;
mod kind;
mod outbound;
mod payloads;

pub use frame::{Frame, HANDSHAKE_ACK_EVENT, HANDSHAKE_EVENT, HANDSHAKE_REJECTED_EVENT};
pub use inbound::{InboundEvent, IncomingEvent};
pub use kind::EventKind;
pub use outbound::OutboundEvent;
pub use payloads::{
    Alert, Availability, AvailabilityChange, ConnectErrorInfo, ConnectionStatus, IncidentRef,
    IncidentStatusChange, LocationUpdate, PatientIncoming, PatientStatusChange,
    ReconnectFailedInfo, ReconnectedInfo, RoomRef, SosReport, SosResponse,
};
