//! The protocol engine.
//!
//! A [`Reader`] owns one connected [`Transport`] and correlates requests
//! with framed responses. One-shot operations send a command and wait for
//! a frame answering the same opcode, retrying past stray bytes and wrong
//! opcodes. Long-running commands (inventory, read, write, lock, kill)
//! return a [`TagStream`]: a lazy sequence of typed responses that ends on
//! the terminator status, on cancellation, or on an unrecoverable
//! transport failure.
//!
//! The reader is single-command-at-a-time by contract. The `is_busy` flag
//! enforces that and doubles as the cooperative cancellation point for
//! streams: [`Reader::stop_inventory`] or a [`CancelToken`] clears it, and
//! the producer observes it before the next read.

use std::marker::PhantomData;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::Duration;

use log::{debug, info, warn};
use protocol::command::{CommandOption, CommandRequest};
use protocol::frame::{self, Command, Frame};
use protocol::reader_settings::{
    AnswerModeInventoryParameter, LockAction, LockMemoryBank, MaskInventoryPermission, MemoryBank,
    NetworkSettings, OutputControl, ReaderSettings, RemoteNetworkSettings, RfidProtocol, StopAfter,
    WorkMode,
};
use protocol::response::{
    Response, ResponseCurrentTemperature, ResponseDeviceInfo, ResponseGetAntennaPower,
    ResponseGetRfidProtocol, ResponseInventory, ResponseInventoryRange,
    ResponseKillTag, ResponseLockMemory, ResponseMaskInventoryPermission,
    ResponseNetworkSettings, ResponseOutputControl, ResponseReadMemory,
    ResponseReaderSettings, ResponseRemoteNetworkSettings, ResponseWriteMemory,
    StreamedResponse,
};

use crate::error::{ReaderError, Result, TransportError};
use crate::transport::{Framing, Transport};

/// Retry ceiling of the one-shot receive loop. A heuristic, not a
/// protocol bound.
pub const RECEIVE_ATTEMPTS: usize = 20;

/// Highest transmit power the firmware accepts, in dBm.
pub const MAX_POWER: u8 = 33;

/// Settle time between arming and stopping the filter-flush inventory.
const PERMISSION_FLUSH_DELAY: Duration = Duration::from_millis(200);

type ByteHook = Box<dyn Fn(&[u8]) + Send>;

/// Clearable handle onto a reader's busy flag. Cancels a running stream
/// from outside the iteration, including from another thread.
#[derive(Clone)]
pub struct CancelToken {
    busy: Arc<AtomicBool>,
}

impl CancelToken {
    /// End the active streaming operation at its next iteration.
    pub fn cancel(&self) {
        self.busy.store(false, Ordering::SeqCst);
    }

    /// Whether a streaming operation is currently active.
    #[must_use]
    pub fn is_busy(&self) -> bool {
        self.busy.load(Ordering::SeqCst)
    }
}

/// Why a [`TagStream`] ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamEnd {
    /// The terminator status arrived
    Terminated,
    /// The busy flag was cleared by `stop_inventory` or a [`CancelToken`]
    Cancelled,
    /// The transport failed unrecoverably
    Failed,
}

/// Handle onto one connected reader.
pub struct Reader {
    transport: Transport,
    is_busy: Arc<AtomicBool>,
    on_tx: Option<ByteHook>,
    on_rx: Option<ByteHook>,
}

impl Reader {
    /// Wrap a connected transport.
    #[must_use]
    pub fn new(transport: Transport) -> Self {
        info!("reader attached over {}", transport.connection_type());
        Self {
            transport,
            is_busy: Arc::new(AtomicBool::new(false)),
            on_tx: None,
            on_rx: None,
        }
    }

    /// Close the transport and consume the handle.
    pub fn close(self) {
        info!("reader closed");
        self.transport.close();
    }

    /// Re-establish the transport with its stored parameters.
    ///
    /// # Errors
    /// [`ReaderError::Transport`] when the channel cannot be reopened.
    pub fn reconnect(&mut self) -> Result<()> {
        self.transport.reconnect()?;
        Ok(())
    }

    /// The transport this reader drives.
    #[must_use]
    pub fn transport(&self) -> &Transport {
        &self.transport
    }

    /// Whether a streaming operation is in flight.
    #[must_use]
    pub fn is_busy(&self) -> bool {
        self.is_busy.load(Ordering::SeqCst)
    }

    /// A handle that can cancel the active stream from anywhere.
    #[must_use]
    pub fn cancel_token(&self) -> CancelToken {
        CancelToken {
            busy: Arc::clone(&self.is_busy),
        }
    }

    /// Observe every serialized request before it is written.
    pub fn set_tx_hook(&mut self, hook: Option<ByteHook>) {
        self.on_tx = hook;
    }

    /// Observe every raw frame as it is received.
    pub fn set_rx_hook(&mut self, hook: Option<ByteHook>) {
        self.on_rx = hook;
    }

    fn notify_rx(&self, bytes: &[u8]) {
        if let Some(hook) = &self.on_rx {
            hook(bytes);
        }
    }

    fn ensure_idle(&self) -> Result<()> {
        if self.is_busy() {
            return Err(ReaderError::Busy);
        }
        Ok(())
    }

    fn send_request(
        &mut self,
        command: &Command,
        clear_buffer: bool,
    ) -> std::result::Result<(), TransportError> {
        let bytes = command.serialize();
        debug!("request {}: {}", command.request, hex::encode_upper(&bytes));
        if let Some(hook) = &self.on_tx {
            hook(&bytes);
        }
        if clear_buffer {
            self.transport.clear_buffer()?;
        }
        self.transport.write_all(&bytes)
    }

    /// Read the bytes of one frame using the transport's reassembly rule.
    ///
    /// `Ok(None)` means "nothing usable this tick": a timeout, a stray
    /// first byte, or a partial frame. Garbage flushes the input buffer on
    /// length-driven transports so the next read starts on a boundary.
    fn read_frame_bytes(
        &mut self,
    ) -> std::result::Result<Option<Vec<u8>>, TransportError> {
        match self.transport.framing() {
            Framing::LengthDriven => {
                let prefix = self.transport.read_bytes(frame::PREFIX_LEN)?;
                if prefix.is_empty()
                    || prefix[0] != frame::HEADER
                    || prefix.len() < frame::PREFIX_LEN
                {
                    self.transport.clear_buffer()?;
                    return Ok(None);
                }
                let body_len = usize::from(prefix[4]) + frame::CHECKSUM_LEN;
                let body = self.transport.read_bytes(body_len)?;
                if body.len() < body_len {
                    self.transport.clear_buffer()?;
                    return Ok(None);
                }
                let mut raw = prefix;
                raw.extend_from_slice(&body);
                Ok(Some(raw))
            }
            Framing::PacketDriven => {
                let mut raw = self.transport.read_packet()?;
                if raw.is_empty() {
                    return Ok(None);
                }
                if raw[0] != frame::HEADER || raw.len() < frame::PREFIX_LEN {
                    self.transport.clear_buffer()?;
                    return Ok(None);
                }
                let Some(total) = frame::declared_frame_len(&raw) else {
                    return Ok(None);
                };
                while raw.len() < total {
                    let more = self.transport.read_packet()?;
                    if more.is_empty() {
                        // reassembly stalled; drop the partial frame
                        return Ok(None);
                    }
                    raw.extend_from_slice(&more);
                }
                // remaining buffer ignored to avoid over-reporting
                raw.truncate(total);
                Ok(Some(raw))
            }
        }
    }

    /// Receive one frame answering `expected`, retrying past stray bytes,
    /// undecodable frames and wrong opcodes.
    ///
    /// `Ok(None)` when the transport went quiet before anything arrived.
    fn receive_response(&mut self, expected: CommandRequest) -> Result<Option<Frame>> {
        for attempt in 0..RECEIVE_ATTEMPTS {
            let Some(raw) = self.read_frame_bytes()? else {
                return Ok(None);
            };
            self.notify_rx(&raw);

            let frame = match Frame::decode(&raw) {
                Ok(frame) => frame,
                Err(error) => {
                    debug!("receive attempt {attempt}: undecodable frame: {error}");
                    self.transport.clear_buffer()?;
                    continue;
                }
            };

            if frame.opcode == expected.value() {
                return Ok(Some(frame));
            }
            warn!(
                "receive attempt {attempt}: dropping opcode {:#06x} while waiting for {expected}",
                frame.opcode
            );
            self.transport.clear_buffer()?;
        }
        Err(ReaderError::OpcodeMismatch {
            expected,
            attempts: RECEIVE_ATTEMPTS,
        })
    }

    /// One-shot exchange: flush, write, receive the matching frame.
    fn execute(&mut self, command: &Command) -> Result<Frame> {
        self.ensure_idle()?;
        let expected = command.request;
        self.send_request(command, true)?;
        self.receive_response(expected)?
            .ok_or(ReaderError::Transport(TransportError::Timeout))
    }

    fn execute_generic(&mut self, command: &Command) -> Result<Response> {
        let frame = self.execute(command)?;
        Ok(Response::from_frame(&frame)?)
    }

    /// Arm a streaming operation: write once, mark busy, hand out the
    /// lazy sequence.
    fn begin_stream<R: StreamedResponse>(
        &mut self,
        command: &Command,
    ) -> Result<TagStream<'_, R>> {
        self.ensure_idle()?;
        let expected = command.request;
        self.send_request(command, true)?;
        self.is_busy.store(true, Ordering::SeqCst);
        Ok(TagStream::new(self, expected))
    }

    /// Initialize the RFID module.
    ///
    /// # Errors
    /// [`ReaderError`] on transport failure or missing response.
    pub fn init(&mut self) -> Result<Response> {
        self.execute_generic(&Command::new(CommandRequest::ModuleInit))
    }

    /// Reboot the reader, restoring factory parameters.
    ///
    /// # Errors
    /// [`ReaderError`] on transport failure or missing response.
    pub fn reboot(&mut self) -> Result<Response> {
        self.execute_generic(&Command::new(CommandRequest::Reboot))
    }

    /// Query hardware and firmware versions.
    ///
    /// # Errors
    /// [`ReaderError`] on transport failure or missing response.
    pub fn get_device_info(&mut self) -> Result<ResponseDeviceInfo> {
        let frame = self.execute(&Command::new(CommandRequest::GetDeviceInfo))?;
        Ok(ResponseDeviceInfo::from_frame(&frame)?)
    }

    /// Set transmit power in dBm, at most [`MAX_POWER`].
    ///
    /// # Errors
    /// [`ReaderError::InvalidArgument`] before any I/O when `power` is out
    /// of range; otherwise transport or correlation errors.
    pub fn set_power(&mut self, power: u8) -> Result<Response> {
        if power > MAX_POWER {
            return Err(ReaderError::InvalidArgument(format!(
                "power {power} exceeds {MAX_POWER} dBm"
            )));
        }
        let command = Command::with_data(CommandRequest::SetPower, vec![power, 0x00]);
        self.execute_generic(&command)
    }

    /// Release (`true`) or close (`false`) the relay. `valid_time` is the
    /// hold time when closing, in units of 10 ms.
    ///
    /// # Errors
    /// [`ReaderError`] on transport failure or missing response.
    pub fn set_relay(&mut self, release: bool, valid_time: u8) -> Result<Response> {
        let release_value: u8 = if release { 0x01 } else { 0x02 };
        let command = Command::with_data(
            CommandRequest::ReleaseCloseRelay,
            vec![release_value, valid_time],
        );
        self.execute_generic(&command)
    }

    /// Query the active air protocol.
    ///
    /// # Errors
    /// [`ReaderError`] on transport failure or missing response.
    pub fn get_rfid_protocol(&mut self) -> Result<ResponseGetRfidProtocol> {
        let command = Command::with_data(
            CommandRequest::SetGetRfidProtocol,
            vec![CommandOption::Get.value(), 0x00],
        );
        let frame = self.execute(&command)?;
        Ok(ResponseGetRfidProtocol::from_frame(&frame)?)
    }

    /// Select the air protocol.
    ///
    /// # Errors
    /// [`ReaderError`] on transport failure or missing response.
    pub fn set_rfid_protocol(&mut self, protocol: RfidProtocol) -> Result<Response> {
        let command = Command::with_data(
            CommandRequest::SetGetRfidProtocol,
            vec![CommandOption::Set.value(), protocol as u8],
        );
        self.execute_generic(&command)
    }

    /// Read the complete parameter block.
    ///
    /// # Errors
    /// [`ReaderError`] on transport failure or missing response.
    pub fn get_reader_settings(&mut self) -> Result<ResponseReaderSettings> {
        let frame = self.execute(&Command::new(CommandRequest::GetAllParam))?;
        Ok(ResponseReaderSettings::from_frame(&frame)?)
    }

    /// Write the complete parameter block.
    ///
    /// # Errors
    /// [`ReaderError::InvalidArgument`] when the power field is out of
    /// range; otherwise transport or correlation errors.
    pub fn set_reader_settings(&mut self, settings: &ReaderSettings) -> Result<Response> {
        if settings.power > MAX_POWER {
            return Err(ReaderError::InvalidArgument(format!(
                "power {} exceeds {MAX_POWER} dBm",
                settings.power
            )));
        }
        let command =
            Command::with_data(CommandRequest::SetAllParam, settings.to_command_data());
        self.execute_generic(&command)
    }

    /// Query the local network configuration.
    ///
    /// # Errors
    /// [`ReaderError`] on transport failure or missing response.
    pub fn get_network_settings(&mut self) -> Result<ResponseNetworkSettings> {
        let command = Command::with_data(
            CommandRequest::SetGetNetwork,
            vec![CommandOption::Get.value()],
        );
        let frame = self.execute(&command)?;
        Ok(ResponseNetworkSettings::from_frame(&frame)?)
    }

    /// Write the local network configuration.
    ///
    /// # Errors
    /// [`ReaderError`] on transport failure or missing response.
    pub fn set_network_settings(&mut self, settings: NetworkSettings) -> Result<Response> {
        let mut data = vec![CommandOption::Set.value()];
        data.extend_from_slice(&settings.to_command_data());
        let command = Command::with_data(CommandRequest::SetGetNetwork, data);
        self.execute_generic(&command)
    }

    /// Query the remote server configuration.
    ///
    /// # Errors
    /// [`ReaderError`] on transport failure or missing response.
    pub fn get_remote_network_settings(&mut self) -> Result<ResponseRemoteNetworkSettings> {
        let command = Command::with_data(
            CommandRequest::SetGetRemoteNetwork,
            vec![CommandOption::Get.value()],
        );
        let frame = self.execute(&command)?;
        Ok(ResponseRemoteNetworkSettings::from_frame(&frame)?)
    }

    /// Write the remote server configuration.
    ///
    /// # Errors
    /// [`ReaderError`] on transport failure or missing response.
    pub fn set_remote_network_settings(
        &mut self,
        settings: RemoteNetworkSettings,
    ) -> Result<Response> {
        let mut data = vec![CommandOption::Set.value()];
        data.extend_from_slice(&settings.to_command_data());
        let command = Command::with_data(CommandRequest::SetGetRemoteNetwork, data);
        self.execute_generic(&command)
    }

    /// Set the over-temperature protection threshold in °C.
    ///
    /// # Errors
    /// [`ReaderError`] on transport failure or missing response.
    pub fn set_max_temperature(&mut self, max_temperature: u8) -> Result<Response> {
        let command =
            Command::with_data(CommandRequest::SetMaxTemperature, vec![max_temperature]);
        self.execute_generic(&command)
    }

    /// Read the module temperature.
    ///
    /// # Errors
    /// [`ReaderError`] on transport failure or missing response.
    pub fn get_current_temperature(&mut self) -> Result<ResponseCurrentTemperature> {
        let frame = self.execute(&Command::new(CommandRequest::GetCurrentTemperature))?;
        Ok(ResponseCurrentTemperature::from_frame(&frame)?)
    }

    /// Query per-antenna power.
    ///
    /// # Errors
    /// [`ReaderError`] on transport failure or missing response.
    pub fn get_antenna_power(&mut self) -> Result<ResponseGetAntennaPower> {
        let command = Command::with_data(
            CommandRequest::SetGetAntennaPower,
            vec![CommandOption::Get.value()],
        );
        let frame = self.execute(&command)?;
        Ok(ResponseGetAntennaPower::from_frame(&frame)?)
    }

    /// Write per-antenna power, antenna 1 first.
    ///
    /// # Errors
    /// [`ReaderError::InvalidArgument`] when any power exceeds
    /// [`MAX_POWER`]; otherwise transport or correlation errors.
    pub fn set_antenna_power(&mut self, enable: bool, power: [u8; 8]) -> Result<Response> {
        if let Some(excess) = power.iter().find(|&&p| p > MAX_POWER) {
            return Err(ReaderError::InvalidArgument(format!(
                "antenna power {excess} exceeds {MAX_POWER} dBm"
            )));
        }
        let mut data = vec![CommandOption::Set.value(), u8::from(enable)];
        data.extend_from_slice(&power);
        let command = Command::with_data(CommandRequest::SetGetAntennaPower, data);
        self.execute_generic(&command)
    }

    /// Restrict subsequent tag commands to tags whose EPC matches `mask`
    /// starting at `start_address` (in bytes). An odd-length mask is
    /// padded with one zero byte; the length field counts bits of the
    /// unpadded mask.
    ///
    /// # Errors
    /// [`ReaderError::InvalidArgument`] before any I/O when the mask or
    /// start address does not fit the wire fields.
    pub fn select_mask(&mut self, mask: &[u8], start_address: u16) -> Result<Response> {
        if mask.len() * 8 > usize::from(u8::MAX) {
            return Err(ReaderError::InvalidArgument(format!(
                "mask of {} bytes exceeds the 255-bit length field",
                mask.len()
            )));
        }
        let Some(bit_pointer) = start_address.checked_mul(8) else {
            return Err(ReaderError::InvalidArgument(format!(
                "start address {start_address} exceeds the 16-bit bit pointer"
            )));
        };

        let mut data = Vec::with_capacity(3 + mask.len() + 1);
        data.extend_from_slice(&bit_pointer.to_be_bytes());
        data.push((mask.len() * 8) as u8);
        data.extend_from_slice(mask);
        if mask.len() % 2 != 0 {
            data.push(0x00);
        }

        let command = Command::with_data(CommandRequest::SelectMask, data);
        self.execute_generic(&command)
    }

    /// Query relay/buzzer output parameters.
    ///
    /// # Errors
    /// [`ReaderError`] on transport failure or missing response.
    pub fn get_output_control(&mut self) -> Result<ResponseOutputControl> {
        let command = Command::with_data(
            CommandRequest::SetGetOutputParameters,
            vec![CommandOption::Get.value()],
        );
        let frame = self.execute(&command)?;
        Ok(ResponseOutputControl::from_frame(&frame)?)
    }

    /// Write relay/buzzer output parameters.
    ///
    /// # Errors
    /// [`ReaderError`] on transport failure or missing response.
    pub fn set_output_control(&mut self, output_control: OutputControl) -> Result<Response> {
        let mut data = vec![CommandOption::Set.value()];
        data.extend_from_slice(&output_control.to_command_data());
        let command = Command::with_data(CommandRequest::SetGetOutputParameters, data);
        self.execute_generic(&command)
    }

    /// Query the standing inventory filter.
    ///
    /// # Errors
    /// [`ReaderError`] on transport failure or missing response.
    pub fn get_mask_inventory_permission(&mut self) -> Result<ResponseMaskInventoryPermission> {
        let command = Command::with_data(
            CommandRequest::SetGetPermission,
            vec![CommandOption::Get.value()],
        );
        let frame = self.execute(&command)?;
        Ok(ResponseMaskInventoryPermission::from_frame(&frame)?)
    }

    /// Write the standing inventory filter, then run and stop a short
    /// two-cycle inventory. The extra round drains the reader's filter
    /// buffer; without it the first real inventory reports stale tags.
    ///
    /// # Errors
    /// [`ReaderError`] on transport failure or missing response.
    pub fn set_mask_inventory_permission(
        &mut self,
        permission: &MaskInventoryPermission,
    ) -> Result<Response> {
        let mut data = vec![CommandOption::Set.value()];
        data.extend_from_slice(&permission.to_command_data());
        let command = Command::with_data(CommandRequest::SetGetPermission, data);
        let response = self.execute_generic(&command)?;

        let parameter = AnswerModeInventoryParameter {
            stop_after: StopAfter::Number,
            value: 2,
        };
        let flush_command = Command::with_data(
            CommandRequest::InventoryIsoContinue,
            parameter.to_command_data(),
        );
        self.send_request(&flush_command, true)?;
        thread::sleep(PERMISSION_FLUSH_DELAY);
        self.send_request(&Command::new(CommandRequest::InventoryStop), false)?;

        Ok(response)
    }

    /// Query the EPC output range.
    ///
    /// # Errors
    /// [`ReaderError`] on transport failure or missing response.
    pub fn get_inventory_range(&mut self) -> Result<ResponseInventoryRange> {
        let command = Command::with_data(
            CommandRequest::InventoryRange,
            vec![CommandOption::Get.value()],
        );
        let frame = self.execute(&command)?;
        Ok(ResponseInventoryRange::from_frame(&frame)?)
    }

    /// Set the EPC output range. `length` 0 outputs the whole EPC.
    ///
    /// # Errors
    /// [`ReaderError`] on transport failure or missing response.
    pub fn set_inventory_range(&mut self, start_address: u8, length: u8) -> Result<Response> {
        let command = Command::with_data(
            CommandRequest::InventoryRange,
            vec![
                CommandOption::Set.value(),
                start_address,
                length,
                0x00,
                0x00,
            ],
        );
        self.execute_generic(&command)
    }

    /// Send an arbitrary catalog command with a raw payload.
    ///
    /// # Errors
    /// [`ReaderError::InvalidArgument`] when the payload exceeds one
    /// frame; otherwise transport or correlation errors.
    pub fn custom(&mut self, request: CommandRequest, data: Vec<u8>) -> Result<Response> {
        if data.len() > frame::MAX_PAYLOAD_LEN {
            return Err(ReaderError::InvalidArgument(format!(
                "payload of {} bytes exceeds one frame",
                data.len()
            )));
        }
        self.execute_generic(&Command::with_data(request, data))
    }

    /// Start a continuous inventory.
    ///
    /// In [`WorkMode::AnswerMode`] the stop parameter is mandatory and the
    /// inventory command is written; in active and trigger modes the
    /// reader pushes frames on its own and only the stream is armed. With
    /// `StopAfter::Time` and value 0 the inventory runs until
    /// [`Reader::stop_inventory`] is called.
    ///
    /// # Errors
    /// [`ReaderError::Busy`] when a stream is already active,
    /// [`ReaderError::InvalidArgument`] when answer mode lacks its
    /// parameter, transport errors from the initial write.
    pub fn start_inventory(
        &mut self,
        work_mode: WorkMode,
        parameter: Option<AnswerModeInventoryParameter>,
    ) -> Result<TagStream<'_, ResponseInventory>> {
        self.ensure_idle()?;
        if work_mode == WorkMode::AnswerMode {
            let parameter = parameter.ok_or_else(|| {
                ReaderError::InvalidArgument(
                    "answer mode inventory requires a stop parameter".to_string(),
                )
            })?;
            let command = Command::with_data(
                CommandRequest::InventoryIsoContinue,
                parameter.to_command_data(),
            );
            self.send_request(&command, true)?;
        }
        self.is_busy.store(true, Ordering::SeqCst);
        info!("inventory started in {work_mode:?}");
        Ok(TagStream::new(self, CommandRequest::InventoryIsoContinue))
    }

    /// Stop a running inventory.
    ///
    /// In [`WorkMode::AnswerMode`] this writes the stop command without
    /// flushing and attempts one best-effort receive, tolerating a quiet
    /// line. The busy flag is cleared in every mode, whether or not the
    /// stop acknowledgment arrived.
    ///
    /// # Errors
    /// [`ReaderError::Transport`] only on a hard channel failure.
    pub fn stop_inventory(&mut self, work_mode: WorkMode) -> Result<()> {
        info!("stopping inventory (busy: {})", self.is_busy());
        if work_mode == WorkMode::AnswerMode {
            if self.is_busy() {
                self.send_request(&Command::new(CommandRequest::InventoryStop), false)?;
            }
            match self.receive_response(CommandRequest::InventoryStop) {
                Ok(_) => {}
                Err(ReaderError::OpcodeMismatch { .. }) => {}
                Err(ReaderError::Transport(TransportError::Timeout)) => {}
                Err(other) => {
                    self.is_busy.store(false, Ordering::SeqCst);
                    return Err(other);
                }
            }
        }
        self.is_busy.store(false, Ordering::SeqCst);
        Ok(())
    }

    /// Read tag memory as a stream of per-tag responses. `start_address`
    /// and `length` are in words. Combine with [`Reader::select_mask`] to
    /// target one tag.
    ///
    /// # Errors
    /// [`ReaderError::Busy`] when a stream is already active, transport
    /// errors from the initial write.
    pub fn read_memory(
        &mut self,
        memory_bank: MemoryBank,
        start_address: u16,
        length: u8,
        access_password: [u8; 4],
    ) -> Result<TagStream<'_, ResponseReadMemory>> {
        let mut data = vec![0x00]; // option
        data.extend_from_slice(&access_password);
        data.push(memory_bank as u8);
        data.extend_from_slice(&start_address.to_be_bytes());
        data.push(length);
        let command = Command::with_data(CommandRequest::ReadIsoTag, data);
        self.begin_stream(&command)
    }

    /// Write `data` to tag memory as a stream of per-tag responses.
    /// `length` 0 defaults to the data length. Combine with
    /// [`Reader::select_mask`] to target one tag.
    ///
    /// # Errors
    /// [`ReaderError::InvalidArgument`] before any I/O when `data` is
    /// empty or does not fit one frame; [`ReaderError::Busy`] when a
    /// stream is already active.
    pub fn write_memory(
        &mut self,
        memory_bank: MemoryBank,
        data: &[u8],
        start_address: u16,
        length: u8,
        access_password: [u8; 4],
    ) -> Result<TagStream<'_, ResponseWriteMemory>> {
        if data.is_empty() {
            return Err(ReaderError::InvalidArgument(
                "write data must not be empty".to_string(),
            ));
        }
        let length = if length == 0 {
            u8::try_from(data.len()).map_err(|_| {
                ReaderError::InvalidArgument(format!(
                    "write data of {} bytes exceeds the length field",
                    data.len()
                ))
            })?
        } else {
            length
        };
        if 9 + data.len() > frame::MAX_PAYLOAD_LEN {
            return Err(ReaderError::InvalidArgument(format!(
                "write data of {} bytes exceeds one frame",
                data.len()
            )));
        }

        let mut payload = vec![0x00]; // option
        payload.extend_from_slice(&access_password);
        payload.push(memory_bank as u8);
        payload.extend_from_slice(&start_address.to_be_bytes());
        payload.push(length);
        payload.extend_from_slice(data);
        let command = Command::with_data(CommandRequest::WriteIsoTag, payload);
        self.begin_stream(&command)
    }

    /// Lock a tag memory bank as a stream of per-tag responses.
    ///
    /// # Errors
    /// [`ReaderError::Busy`] when a stream is already active, transport
    /// errors from the initial write.
    pub fn lock_memory(
        &mut self,
        lock_memory_bank: LockMemoryBank,
        lock_action: LockAction,
        access_password: [u8; 4],
    ) -> Result<TagStream<'_, ResponseLockMemory>> {
        let mut data = access_password.to_vec();
        data.push(lock_memory_bank as u8);
        data.push(lock_action as u8);
        let command = Command::with_data(CommandRequest::LockIsoTag, data);
        self.begin_stream(&command)
    }

    /// Kill tags as a stream of per-tag responses. Irreversible.
    ///
    /// # Errors
    /// [`ReaderError::Busy`] when a stream is already active, transport
    /// errors from the initial write.
    pub fn kill_tag(
        &mut self,
        kill_password: [u8; 4],
    ) -> Result<TagStream<'_, ResponseKillTag>> {
        let command =
            Command::with_data(CommandRequest::KillIsoTag, kill_password.to_vec());
        self.begin_stream(&command)
    }
}

/// Lazy sequence of typed responses from a streaming command.
///
/// Each `next()` performs at most one transport read. `Some(None)` means
/// "no frame this tick": the caller may keep polling or cancel. The
/// sequence ends (`None`) on the terminator status, when the busy flag is
/// cleared, or on an unrecoverable transport failure; every end path
/// clears the reader's busy flag.
pub struct TagStream<'a, R: StreamedResponse> {
    reader: &'a mut Reader,
    expected: CommandRequest,
    end: Option<StreamEnd>,
    failure: Option<TransportError>,
    _response: PhantomData<R>,
}

impl<'a, R: StreamedResponse> TagStream<'a, R> {
    fn new(reader: &'a mut Reader, expected: CommandRequest) -> Self {
        Self {
            reader,
            expected,
            end: None,
            failure: None,
            _response: PhantomData,
        }
    }

    /// Why the stream ended; `None` while it is still live.
    #[must_use]
    pub fn end(&self) -> Option<StreamEnd> {
        self.end
    }

    /// A handle that cancels this stream, usable from another thread.
    #[must_use]
    pub fn cancel_token(&self) -> CancelToken {
        self.reader.cancel_token()
    }

    /// Stop the underlying inventory through the owning reader. The
    /// stream itself ends at its next iteration.
    ///
    /// # Errors
    /// [`ReaderError::Transport`] on a hard channel failure.
    pub fn stop(&mut self, work_mode: WorkMode) -> Result<()> {
        self.reader.stop_inventory(work_mode)
    }

    /// Drive the stream to its end, collecting every yielded response.
    /// Gives up after `max_quiet_ticks` consecutive quiet ticks.
    ///
    /// # Errors
    /// [`ReaderError::Cancelled`] when the stream was cancelled,
    /// [`ReaderError::Transport`] when it failed or went quiet for too
    /// long.
    pub fn try_collect(mut self, max_quiet_ticks: usize) -> Result<Vec<R>> {
        let mut items = Vec::new();
        let mut quiet = 0usize;
        loop {
            match self.next() {
                Some(Some(response)) => {
                    quiet = 0;
                    items.push(response);
                }
                Some(None) => {
                    quiet += 1;
                    if quiet >= max_quiet_ticks {
                        self.finish(StreamEnd::Cancelled);
                        return Err(ReaderError::Transport(TransportError::Timeout));
                    }
                }
                None => break,
            }
        }
        match self.end {
            Some(StreamEnd::Cancelled) => Err(ReaderError::Cancelled),
            Some(StreamEnd::Failed) => Err(match self.failure.take() {
                Some(error) => ReaderError::Transport(error),
                None => ReaderError::Transport(TransportError::Disconnected),
            }),
            Some(StreamEnd::Terminated) | None => Ok(items),
        }
    }

    fn finish(&mut self, end: StreamEnd) {
        if self.end.is_none() {
            debug!("stream ended: {end:?}");
            self.end = Some(end);
        }
        self.reader.is_busy.store(false, Ordering::SeqCst);
    }

    /// Flush after garbage and yield a quiet tick; a failing flush ends
    /// the stream instead.
    fn flush_tick(&mut self) -> Option<Option<R>> {
        match self.reader.transport.clear_buffer() {
            Ok(()) => Some(None),
            Err(error) => {
                self.failure = Some(error);
                self.finish(StreamEnd::Failed);
                None
            }
        }
    }
}

impl<R: StreamedResponse> Iterator for TagStream<'_, R> {
    type Item = Option<R>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.end.is_some() {
            return None;
        }
        if !self.reader.is_busy() {
            self.finish(StreamEnd::Cancelled);
            return None;
        }

        let raw = match self.reader.read_frame_bytes() {
            Ok(Some(raw)) => raw,
            Ok(None) => return Some(None),
            Err(TransportError::Timeout) => return Some(None),
            Err(error) => {
                warn!("stream aborted by transport failure: {error}");
                self.failure = Some(error);
                self.finish(StreamEnd::Failed);
                return None;
            }
        };
        self.reader.notify_rx(&raw);

        let frame = match Frame::decode(&raw) {
            Ok(frame) => frame,
            Err(error) => {
                debug!("stream: discarding undecodable frame: {error}");
                return self.flush_tick();
            }
        };

        // a late stop acknowledgment is swallowed, never yielded
        if frame.opcode == CommandRequest::InventoryStop.value() {
            return Some(None);
        }
        if frame.opcode != self.expected.value() {
            debug!(
                "stream: dropping opcode {:#06x} while streaming {}",
                frame.opcode, self.expected
            );
            return self.flush_tick();
        }

        let response = match R::from_frame(&frame) {
            Ok(response) => response,
            Err(error) => {
                debug!("stream: discarding unparsable payload: {error}");
                return self.flush_tick();
            }
        };

        if response.is_terminator() {
            self.finish(StreamEnd::Terminated);
            return Some(Some(response));
        }
        Some(Some(response))
    }
}

#[cfg(test)]
mod tests {
    use protocol::frame::{checksum, HEADER};
    use protocol::reader_settings::{
        Antenna, BaudRate, Frequency, OutputInterface, Region, Session, Wiegand,
        WiegandByteFirstType, WiegandProtocol,
    };
    use protocol::status::{InventoryStatus, Status};

    use super::*;
    use crate::transport::mock::MockTransport;

    fn frame_bytes(opcode: u16, payload: &[u8]) -> Vec<u8> {
        let mut out = vec![HEADER, 0x00];
        out.extend_from_slice(&opcode.to_be_bytes());
        out.push(payload.len() as u8);
        out.extend_from_slice(payload);
        let ck = checksum(&out);
        out.extend_from_slice(&ck.to_le_bytes());
        out
    }

    fn inventory_frame(epc: &[u8], rssi: u8) -> Vec<u8> {
        let mut payload = vec![0x00, 0x01, 0x34, 0x12, 0x30, 0x00];
        payload.push(epc.len() as u8);
        payload.extend_from_slice(epc);
        payload.push(rssi);
        frame_bytes(CommandRequest::InventoryIsoContinue.value(), &payload)
    }

    fn inventory_terminator() -> Vec<u8> {
        frame_bytes(
            CommandRequest::InventoryIsoContinue.value(),
            &[InventoryStatus::NoCountLabel as u8],
        )
    }

    fn device_info_frame() -> Vec<u8> {
        frame_bytes(
            CommandRequest::GetDeviceInfo.value(),
            &[0x00, 0x01, 0x00, 0x02, 0x03],
        )
    }

    fn sample_settings() -> ReaderSettings {
        ReaderSettings {
            address: 0,
            rfid_protocol: RfidProtocol::Iso18000_6c,
            work_mode: WorkMode::AnswerMode,
            output_interface: OutputInterface::Usb,
            baud_rate: BaudRate::Bps115200,
            wiegand: Wiegand {
                is_open: false,
                byte_first_type: WiegandByteFirstType::LowByteFirst,
                protocol: WiegandProtocol::Wg26,
            },
            antenna: Antenna::one(),
            frequency: Frequency {
                region: Region::Malaysia,
                min_frequency: 919.5,
                max_frequency: 922.5,
            },
            power: 30,
            output_memory_bank: MemoryBank::Epc,
            q_value: 4,
            session: Session::Session0,
            output_start_address: 0,
            output_length: 12,
            filter_time: 0,
            trigger_time: 3,
            buzzer: true,
            inventory_interval: 100,
        }
    }

    fn settings_frame(settings: &ReaderSettings) -> Vec<u8> {
        let mut payload = vec![Status::Success as u8];
        payload.extend_from_slice(&settings.to_command_data());
        frame_bytes(CommandRequest::GetAllParam.value(), &payload)
    }

    fn answer_mode_two_cycles() -> Option<AnswerModeInventoryParameter> {
        Some(AnswerModeInventoryParameter {
            stop_after: StopAfter::Number,
            value: 2,
        })
    }

    fn mock_of(reader: &Reader) -> &MockTransport {
        match &reader.transport {
            Transport::Mock(mock) => mock,
            _ => unreachable!(),
        }
    }

    #[test]
    fn get_device_info_round_trip() {
        let mut mock = MockTransport::length_driven();
        mock.push_data(device_info_frame());
        let mut reader = Reader::new(Transport::Mock(mock));

        let response = reader.get_device_info().unwrap();
        assert_eq!(response.status, Status::Success);
        let info = response.device_info.unwrap();
        assert_eq!(info.hardware_version.to_string(), "1.0");
        assert_eq!(info.firmware_version.to_string(), "2.3");

        let written = &mock_of(&reader).written;
        assert_eq!(written.len(), 1);
        assert_eq!(
            written[0],
            Command::new(CommandRequest::GetDeviceInfo).serialize()
        );
        assert_eq!(&written[0][..5], &[HEADER, 0x00, 0x00, 0x68, 0x00]);
    }

    #[test]
    fn one_shot_times_out_on_a_quiet_line() {
        let mock = MockTransport::length_driven();
        let mut reader = Reader::new(Transport::Mock(mock));
        assert!(matches!(
            reader.get_device_info(),
            Err(ReaderError::Transport(TransportError::Timeout))
        ));
    }

    #[test]
    fn answer_mode_inventory_yields_tags_then_terminator() {
        let mut mock = MockTransport::length_driven();
        mock.push_data(inventory_frame(&[0xE2, 0x00, 0x11, 0x22], 0xC5));
        mock.push_data(inventory_frame(&[0xE2, 0x00, 0x33, 0x44], 0xB0));
        mock.push_data(inventory_terminator());
        let mut reader = Reader::new(Transport::Mock(mock));

        let mut stream = reader
            .start_inventory(WorkMode::AnswerMode, answer_mode_two_cycles())
            .unwrap();

        let first = stream.next().unwrap().unwrap();
        assert_eq!(first.status, InventoryStatus::Success);
        assert_eq!(first.tag.as_ref().unwrap().epc, vec![0xE2, 0x00, 0x11, 0x22]);

        let second = stream.next().unwrap().unwrap();
        assert_eq!(second.tag.as_ref().unwrap().epc, vec![0xE2, 0x00, 0x33, 0x44]);

        let last = stream.next().unwrap().unwrap();
        assert_eq!(last.status, InventoryStatus::NoCountLabel);
        assert!(last.tag.is_none());

        assert!(stream.next().is_none());
        assert_eq!(stream.end(), Some(StreamEnd::Terminated));
        drop(stream);

        assert!(!reader.is_busy());
        let written = &mock_of(&reader).written;
        assert_eq!(
            written[0],
            Command::with_data(
                CommandRequest::InventoryIsoContinue,
                vec![StopAfter::Number as u8, 0, 0, 0, 2],
            )
            .serialize()
        );
    }

    #[test]
    fn answer_mode_inventory_requires_a_parameter() {
        let mock = MockTransport::length_driven();
        let mut reader = Reader::new(Transport::Mock(mock));
        assert!(matches!(
            reader.start_inventory(WorkMode::AnswerMode, None),
            Err(ReaderError::InvalidArgument(_))
        ));
        assert!(!reader.is_busy());
        assert!(mock_of(&reader).written.is_empty());
    }

    #[test]
    fn serial_stream_recovers_from_stray_byte() {
        let mut mock = MockTransport::length_driven();
        mock.push_data(vec![0xFF]);
        mock.push_data(inventory_frame(&[0xAB, 0xCD], 0x90));
        let mut reader = Reader::new(Transport::Mock(mock));

        let mut stream = reader
            .start_inventory(WorkMode::AnswerMode, answer_mode_two_cycles())
            .unwrap();

        // stray byte: flushed, quiet tick
        assert_eq!(stream.next(), Some(None));
        let tag = stream.next().unwrap().unwrap();
        assert_eq!(tag.tag.unwrap().epc, vec![0xAB, 0xCD]);
        drop(stream);

        assert!(mock_of(&reader).flushes >= 1);
    }

    #[test]
    fn usb_fragmented_frame_is_reassembled() {
        // one 80-byte logical frame delivered as 64 + 16
        let epc = vec![0x5A; 65];
        let bytes = inventory_frame(&epc, 0x77);
        assert_eq!(bytes.len(), 80);

        let mut mock = MockTransport::packet_driven();
        mock.push_data(bytes[..64].to_vec());
        mock.push_data(bytes[64..].to_vec());
        let mut reader = Reader::new(Transport::Mock(mock));

        let mut stream = reader
            .start_inventory(WorkMode::AnswerMode, answer_mode_two_cycles())
            .unwrap();
        let tag = stream.next().unwrap().unwrap();
        assert_eq!(tag.tag.unwrap().epc, epc);
    }

    #[test]
    fn usb_packet_with_two_frames_yields_only_the_first() {
        let mut packet = inventory_frame(&[0x11, 0x11], 0x80);
        packet.extend_from_slice(&inventory_frame(&[0x22, 0x22], 0x81));

        let mut mock = MockTransport::packet_driven();
        mock.push_data(packet);
        mock.push_data(inventory_terminator());
        let mut reader = Reader::new(Transport::Mock(mock));

        let mut stream = reader
            .start_inventory(WorkMode::AnswerMode, answer_mode_two_cycles())
            .unwrap();
        let first = stream.next().unwrap().unwrap();
        assert_eq!(first.tag.unwrap().epc, vec![0x11, 0x11]);
        // the second frame in the packet was discarded, not yielded
        let next = stream.next().unwrap().unwrap();
        assert_eq!(next.status, InventoryStatus::NoCountLabel);
    }

    #[test]
    fn usb_stalled_reassembly_yields_a_quiet_tick() {
        let bytes = inventory_frame(&[0x5A; 65], 0x77);
        let mut mock = MockTransport::packet_driven();
        mock.push_data(bytes[..64].to_vec());
        mock.push_timeout();
        let mut reader = Reader::new(Transport::Mock(mock));

        let mut stream = reader
            .start_inventory(WorkMode::AnswerMode, answer_mode_two_cycles())
            .unwrap();
        assert_eq!(stream.next(), Some(None));
    }

    #[test]
    fn one_shot_retries_past_wrong_opcodes() {
        let settings = sample_settings();
        let mut mock = MockTransport::length_driven();
        for _ in 0..3 {
            mock.push_data(inventory_frame(&[0x01, 0x02], 0x60));
        }
        mock.push_data(settings_frame(&settings));
        let mut reader = Reader::new(Transport::Mock(mock));

        let response = reader.get_reader_settings().unwrap();
        assert_eq!(response.settings.unwrap(), settings);
        assert!(mock_of(&reader).flushes >= 3);
    }

    #[test]
    fn one_shot_flushes_after_a_parse_error() {
        let mut corrupted = device_info_frame();
        let index = corrupted.len() - 4;
        corrupted[index] ^= 0x55;

        let mut mock = MockTransport::length_driven();
        mock.push_data(corrupted);
        mock.push_data(device_info_frame());
        let mut reader = Reader::new(Transport::Mock(mock));

        let response = reader.get_device_info().unwrap();
        assert!(response.device_info.is_some());
        assert!(mock_of(&reader).flushes >= 1);
    }

    #[test]
    fn stop_inventory_mid_stream() {
        let mut mock = MockTransport::length_driven();
        mock.push_data(inventory_frame(&[0xAA, 0xBB], 0xA0));
        mock.push_data(frame_bytes(
            CommandRequest::InventoryStop.value(),
            &[Status::Success as u8],
        ));
        let mut reader = Reader::new(Transport::Mock(mock));

        let mut stream = reader
            .start_inventory(WorkMode::AnswerMode, answer_mode_two_cycles())
            .unwrap();
        let tag = stream.next().unwrap().unwrap();
        assert_eq!(tag.tag.unwrap().epc, vec![0xAA, 0xBB]);

        stream.stop(WorkMode::AnswerMode).unwrap();
        assert!(stream.next().is_none());
        assert_eq!(stream.end(), Some(StreamEnd::Cancelled));
        drop(stream);

        assert!(!reader.is_busy());
        let written = &mock_of(&reader).written;
        assert_eq!(written.len(), 2);
        assert_eq!(
            written[1],
            Command::new(CommandRequest::InventoryStop).serialize()
        );
    }

    #[test]
    fn stop_inventory_tolerates_a_quiet_line() {
        let mock = MockTransport::length_driven();
        let mut reader = Reader::new(Transport::Mock(mock));
        reader.is_busy.store(true, Ordering::SeqCst);
        reader.stop_inventory(WorkMode::AnswerMode).unwrap();
        assert!(!reader.is_busy());
    }

    #[test]
    fn stop_inventory_outside_answer_mode_only_clears_the_flag() {
        let mock = MockTransport::length_driven();
        let mut reader = Reader::new(Transport::Mock(mock));
        reader.is_busy.store(true, Ordering::SeqCst);
        reader.stop_inventory(WorkMode::ActiveMode).unwrap();
        assert!(!reader.is_busy());
        assert!(mock_of(&reader).written.is_empty());
    }

    #[test]
    fn cancel_token_ends_the_stream() {
        let mut mock = MockTransport::length_driven();
        mock.push_data(inventory_frame(&[0x10, 0x20], 0x70));
        let mut reader = Reader::new(Transport::Mock(mock));

        let mut stream = reader
            .start_inventory(WorkMode::AnswerMode, answer_mode_two_cycles())
            .unwrap();
        let token = stream.cancel_token();
        assert!(stream.next().unwrap().is_some());
        token.cancel();
        assert!(stream.next().is_none());
        assert_eq!(stream.end(), Some(StreamEnd::Cancelled));
        drop(stream);
        assert!(!reader.is_busy());
    }

    #[test]
    fn transport_failure_ends_the_stream() {
        let mut mock = MockTransport::length_driven();
        mock.push_data(inventory_frame(&[0x10, 0x20], 0x70));
        mock.push_failure(TransportError::Disconnected);
        let mut reader = Reader::new(Transport::Mock(mock));

        let mut stream = reader
            .start_inventory(WorkMode::AnswerMode, answer_mode_two_cycles())
            .unwrap();
        assert!(stream.next().unwrap().is_some());
        assert!(stream.next().is_none());
        assert_eq!(stream.end(), Some(StreamEnd::Failed));
        drop(stream);
        assert!(!reader.is_busy());
    }

    #[test]
    fn late_stop_acknowledgment_is_swallowed() {
        let mut mock = MockTransport::length_driven();
        mock.push_data(frame_bytes(
            CommandRequest::InventoryStop.value(),
            &[Status::Success as u8],
        ));
        mock.push_data(inventory_frame(&[0x42], 0x55));
        let mut reader = Reader::new(Transport::Mock(mock));

        let mut stream = reader
            .start_inventory(WorkMode::AnswerMode, answer_mode_two_cycles())
            .unwrap();
        assert_eq!(stream.next(), Some(None));
        assert!(stream.next().unwrap().is_some());
    }

    #[test]
    fn busy_reader_rejects_new_operations() {
        let mock = MockTransport::length_driven();
        let mut reader = Reader::new(Transport::Mock(mock));
        reader.is_busy.store(true, Ordering::SeqCst);
        assert!(matches!(reader.get_device_info(), Err(ReaderError::Busy)));
        assert!(matches!(
            reader.start_inventory(WorkMode::AnswerMode, answer_mode_two_cycles()),
            Err(ReaderError::Busy)
        ));
        assert!(mock_of(&reader).written.is_empty());
    }

    #[test]
    fn set_power_out_of_range_writes_nothing() {
        let mock = MockTransport::length_driven();
        let mut reader = Reader::new(Transport::Mock(mock));
        assert!(matches!(
            reader.set_power(MAX_POWER + 1),
            Err(ReaderError::InvalidArgument(_))
        ));
        assert!(mock_of(&reader).written.is_empty());
    }

    #[test]
    fn select_mask_pads_an_odd_mask() {
        let mut mock = MockTransport::length_driven();
        mock.push_data(frame_bytes(
            CommandRequest::SelectMask.value(),
            &[Status::Success as u8],
        ));
        let mut reader = Reader::new(Transport::Mock(mock));

        let response = reader.select_mask(&[0xAA, 0xBB, 0xCC], 2).unwrap();
        assert_eq!(response.status, Status::Success);

        let written = &mock_of(&reader).written;
        let frame = Frame::decode(&written[0]).unwrap();
        // bit pointer 16, 24 mask bits, one zero pad byte
        assert_eq!(frame.payload, vec![0x00, 0x10, 24, 0xAA, 0xBB, 0xCC, 0x00]);
    }

    #[test]
    fn select_mask_rejects_an_oversized_mask() {
        let mock = MockTransport::length_driven();
        let mut reader = Reader::new(Transport::Mock(mock));
        assert!(matches!(
            reader.select_mask(&[0u8; 32], 0),
            Err(ReaderError::InvalidArgument(_))
        ));
    }

    #[test]
    fn write_memory_length_defaults_to_data_length() {
        let mut mock = MockTransport::length_driven();
        mock.push_data(frame_bytes(
            CommandRequest::WriteIsoTag.value(),
            &[Status::NoCountLabel as u8],
        ));
        let mut reader = Reader::new(Transport::Mock(mock));

        let stream = reader
            .write_memory(MemoryBank::User, &[0x01, 0x02, 0x03, 0x04], 0, 0, [0; 4])
            .unwrap();
        let responses = stream.try_collect(5).unwrap();
        assert_eq!(responses.len(), 1);
        assert!(responses[0].is_terminator());
        assert!(!reader.is_busy());

        let written = &mock_of(&reader).written;
        let frame = Frame::decode(&written[0]).unwrap();
        assert_eq!(
            frame.payload,
            vec![0x00, 0, 0, 0, 0, MemoryBank::User as u8, 0, 0, 4, 1, 2, 3, 4]
        );
    }

    #[test]
    fn write_memory_rejects_empty_data() {
        let mock = MockTransport::length_driven();
        let mut reader = Reader::new(Transport::Mock(mock));
        assert!(matches!(
            reader.write_memory(MemoryBank::User, &[], 0, 0, [0; 4]),
            Err(ReaderError::InvalidArgument(_))
        ));
        assert!(mock_of(&reader).written.is_empty());
    }

    #[test]
    fn read_memory_streams_until_terminator() {
        let mut tag_payload = vec![
            Status::Success as u8,
            0x01,
            0x34,
            0x12,
            0x30,
            0x00,
            0x02,
            0xAA,
            0xBB,
        ];
        tag_payload.push(0x01); // one word
        tag_payload.extend_from_slice(&[0xDE, 0xAD]);

        let mut mock = MockTransport::length_driven();
        mock.push_data(frame_bytes(CommandRequest::ReadIsoTag.value(), &tag_payload));
        mock.push_timeout();
        mock.push_data(frame_bytes(
            CommandRequest::ReadIsoTag.value(),
            &[Status::NoCountLabel as u8],
        ));
        let mut reader = Reader::new(Transport::Mock(mock));

        let stream = reader
            .read_memory(MemoryBank::User, 0, 1, [0; 4])
            .unwrap();
        let responses = stream.try_collect(5).unwrap();
        assert_eq!(responses.len(), 2);
        assert_eq!(responses[0].data, vec![0xDE, 0xAD]);
        assert!(responses[1].is_terminator());
        assert!(!reader.is_busy());
    }

    #[test]
    fn try_collect_reports_cancellation() {
        let mut mock = MockTransport::length_driven();
        mock.push_data(inventory_frame(&[0x77], 0x40));
        let mut reader = Reader::new(Transport::Mock(mock));

        let mut stream = reader
            .start_inventory(WorkMode::AnswerMode, answer_mode_two_cycles())
            .unwrap();
        let token = stream.cancel_token();
        assert!(stream.next().unwrap().is_some());
        token.cancel();
        assert!(matches!(
            stream.try_collect(5),
            Err(ReaderError::Cancelled)
        ));
        assert!(!reader.is_busy());
    }

    #[test]
    fn custom_command_rejects_oversized_payload() {
        let mock = MockTransport::length_driven();
        let mut reader = Reader::new(Transport::Mock(mock));
        assert!(matches!(
            reader.custom(CommandRequest::ModuleInit, vec![0u8; 256]),
            Err(ReaderError::InvalidArgument(_))
        ));
    }
}
