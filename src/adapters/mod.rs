//! Adapters: concrete implementations of the hexagonal port traits.
//!
//! | Adapter        | Implements     | Connects to                         |
//! |----------------|----------------|-------------------------------------|
//! | `radio`        | RadioPort      | ESP-IDF WiFi (AP+STA), event loop   |
//! | `indicator`    | IndicatorSink  | Signal → LED task → RGB status LED  |
//! | `http_service` | ServicePort    | ESP-IDF HTTP server (provisioning)  |

pub mod http_service;
pub mod indicator;
pub mod radio;
