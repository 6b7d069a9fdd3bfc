//! USB Transport
//!
//! Bulk transfers on the real board through nusb.
//!
//! nusb transfers are futures; each call here blocks on one transfer, racing
//! it against a timer when a timeout is given. Dropping a timed-out transfer
//! cancels it.

use std::future::Future;
use std::time::Duration;

use async_io::Timer;
use futures_lite::future::{self, block_on};
use nusb::transfer::RequestBuffer;
use nusb::{Device, Interface};

use crate::config::Config;
use crate::error::{HydraError, Result};
use super::Transport;

/// A claimed interface on the HydraDancer board
pub struct UsbTransport {
    /// Claimed interface, released on drop
    interface: Interface,

    /// Keeps the device handle open for the lifetime of the interface
    _device: Device,

    /// Interface number, for logging
    interface_number: u8,
}

impl UsbTransport {
    /// Find the board by VID/PID, detach any kernel driver and claim the
    /// configured interface
    pub fn open(config: &Config) -> Result<Self> {
        let info = nusb::list_devices()
            .map_err(|e| HydraError::Usb(format!("device enumeration failed: {}", e)))?
            .find(|d| d.vendor_id() == config.vendor_id && d.product_id() == config.product_id)
            .ok_or(HydraError::DeviceNotFound {
                vendor_id: config.vendor_id,
                product_id: config.product_id,
            })?;

        tracing::info!(
            bus = info.bus_number(),
            address = info.device_address(),
            "Found device {:04x}:{:04x}",
            config.vendor_id,
            config.product_id
        );

        let device = info
            .open()
            .map_err(|e| HydraError::Usb(format!("failed to open device: {}", e)))?;

        let interface = device
            .detach_and_claim_interface(config.interface)
            .map_err(|e| {
                HydraError::Usb(format!(
                    "failed to claim interface {}: {}",
                    config.interface, e
                ))
            })?;

        tracing::debug!("Claimed interface {}", config.interface);

        Ok(Self {
            interface,
            _device: device,
            interface_number: config.interface,
        })
    }
}

/// Block on `transfer`, giving up after `timeout` if one is set
fn wait<T>(transfer: impl Future<Output = T>, timeout: Option<Duration>) -> Option<T> {
    match timeout {
        None => Some(block_on(transfer)),
        Some(limit) => block_on(future::or(async move { Some(transfer.await) }, async move {
            Timer::after(limit).await;
            None
        })),
    }
}

impl Transport for UsbTransport {
    fn write_bulk(&mut self, endpoint: u8, data: &[u8], timeout: Option<Duration>) -> Result<usize> {
        let completion = wait(self.interface.bulk_out(endpoint, data.to_vec()), timeout).ok_or_else(
            || HydraError::TransportWrite {
                endpoint,
                reason: "timed out".to_string(),
            },
        )?;

        completion.status.map_err(|e| HydraError::TransportWrite {
            endpoint,
            reason: e.to_string(),
        })?;

        Ok(completion.data.actual_length())
    }

    fn read_bulk(
        &mut self,
        endpoint: u8,
        buf: &mut [u8],
        timeout: Option<Duration>,
    ) -> Result<usize> {
        let completion = wait(
            self.interface.bulk_in(endpoint, RequestBuffer::new(buf.len())),
            timeout,
        )
        .ok_or_else(|| HydraError::TransportRead {
            endpoint,
            reason: "timed out".to_string(),
        })?;

        let data = completion.into_result().map_err(|e| HydraError::TransportRead {
            endpoint,
            reason: e.to_string(),
        })?;

        let n = data.len().min(buf.len());
        buf[..n].copy_from_slice(&data[..n]);
        Ok(n)
    }
}

impl Drop for UsbTransport {
    fn drop(&mut self) {
        tracing::debug!("Releasing interface {}", self.interface_number);
    }
}
