//! UART endpoint: the driver and monitor bound to a design's pins.
//!
//! An endpoint is bound once, with a fixed configuration and role. In the
//! active role it owns a drive line, parked at the idle level on bind, and
//! may also observe a line. In the passive role it only observes.
//!
//! Operations are suspension points on the injected [`Environment`]. Between
//! two waits everything (encoding, assembling, decoding) happens in zero
//! simulated time.

use std::time::Duration;

use tracing::{debug, info, warn};
use uartvip_proto::{FrameFormat, FrameStatus, Parity, Transaction, encode_transaction};

use crate::{
    Environment, FrameAssembler, IdAllocator, Line, LineResolver, PinNames, Role, UartConfig,
    VipId,
    error::{BindError, Direction, EndpointError},
    sampler::BitSampler,
};

/// UART verification endpoint.
///
/// Generic over the environment and the line type so the same code runs
/// against the deterministic harness or any other simulator binding.
#[derive(Debug)]
pub struct Endpoint<E, L> {
    id: VipId,
    config: UartConfig,
    format: FrameFormat,
    env: E,
    /// Present exactly when the role is active
    drive: Option<L>,
    observe: Option<BitSampler<E, L>>,
}

impl<E: Environment, L: Line> Endpoint<E, L> {
    /// Validate `config`, resolve pins and park the drive line at idle.
    ///
    /// Active endpoints need a drive pin and may have an observe pin. Passive
    /// endpoints need an observe pin; a drive pin, if given, is ignored.
    ///
    /// # Errors
    ///
    /// - `EndpointError::Config` if `config` fails validation
    /// - `EndpointError::Bind` if a required pin is missing or does not
    ///   resolve
    pub fn bind<R>(
        id: VipId,
        config: UartConfig,
        env: E,
        resolver: &R,
        pins: &PinNames,
    ) -> Result<Self, EndpointError>
    where
        R: LineResolver<Line = L>,
    {
        config.validate()?;
        let format = config.frame_format()?;

        let drive = if config.role.can_drive() {
            let path = pins
                .drive
                .as_deref()
                .ok_or(BindError::MissingPin { role: config.role, direction: Direction::Drive })?;
            Some(resolve(resolver, path)?)
        } else {
            if let Some(path) = &pins.drive {
                debug!(vip = %id, pin = %path, "passive endpoint ignores drive pin");
            }
            None
        };

        let observe = match pins.observe.as_deref() {
            Some(path) => Some(resolve(resolver, path)?),
            None if config.role == Role::Passive => {
                return Err(BindError::MissingPin {
                    role: config.role,
                    direction: Direction::Observe,
                }
                .into());
            },
            None => None,
        };

        if let Some(line) = &drive {
            line.drive(true);
        }

        info!(
            vip = %id,
            role = %config.role,
            baud_rate = config.baud_rate,
            format = %format,
            drive = pins.drive.as_deref().filter(|_| drive.is_some()).unwrap_or("-"),
            observe = pins.observe.as_deref().unwrap_or("-"),
            "endpoint bound"
        );

        let bit_period = config.bit_period();
        Ok(Self {
            id,
            config,
            format,
            observe: observe.map(|line| BitSampler::new(env.clone(), line, bit_period)),
            drive,
            env,
        })
    }

    /// [`Endpoint::bind`] with an id drawn from `ids`.
    pub fn bind_with<R>(
        ids: &IdAllocator,
        config: UartConfig,
        env: E,
        resolver: &R,
        pins: &PinNames,
    ) -> Result<Self, EndpointError>
    where
        R: LineResolver<Line = L>,
    {
        Self::bind(ids.next_id(), config, env, resolver, pins)
    }

    /// Endpoint identifier.
    pub fn id(&self) -> VipId {
        self.id
    }

    /// Configuration fixed at bind time.
    pub fn config(&self) -> &UartConfig {
        &self.config
    }

    /// Line speed in bits per second.
    pub fn baud_rate(&self) -> u32 {
        self.config.baud_rate
    }

    /// Parity mode.
    pub fn parity(&self) -> Option<Parity> {
        self.config.parity
    }

    /// Active or passive.
    pub fn role(&self) -> Role {
        self.config.role
    }

    /// Frame format.
    pub fn format(&self) -> FrameFormat {
        self.format
    }

    /// Duration of one slot.
    pub fn bit_period(&self) -> Duration {
        self.config.bit_period()
    }

    /// Drive one frame carrying `data`, masked to the data width.
    ///
    /// Waits a random idle time in `[0, bit_period]` first, then holds each
    /// slot for one bit period. Returns the intended transaction, stamped
    /// with the time of the start edge, once the stop bit has been driven
    /// for its full period.
    ///
    /// # Errors
    ///
    /// - `EndpointError::Role` on a passive endpoint; the line is untouched
    pub async fn transmit(&self, data: u8) -> Result<Transaction, EndpointError> {
        self.send(data, true, "transmit").await
    }

    /// Like [`Endpoint::transmit`], but with the parity bit inverted.
    pub async fn transmit_bad_parity(&self, data: u8) -> Result<Transaction, EndpointError> {
        self.send(data, false, "transmit_bad_parity").await
    }

    /// Drive a prepared transaction verbatim, e.g. with a low stop bit.
    ///
    /// # Errors
    ///
    /// - `EndpointError::Role` on a passive endpoint
    /// - `EndpointError::FormatMismatch` if `txn` was built for another format
    pub async fn transmit_transaction(&self, txn: &Transaction) -> Result<(), EndpointError> {
        let line = self.drive_line("transmit_transaction")?;
        if txn.format() != self.format {
            return Err(EndpointError::FormatMismatch {
                id: self.id,
                expected: self.format,
                actual: txn.format(),
            });
        }

        self.idle_delay().await;
        self.drive_frame(line, txn).await;
        Ok(())
    }

    async fn send(
        &self,
        data: u8,
        good_parity: bool,
        operation: &'static str,
    ) -> Result<Transaction, EndpointError> {
        let line = self.drive_line(operation)?;

        self.idle_delay().await;
        let txn = Transaction::new(data, self.format, good_parity, self.env.now());
        self.drive_frame(line, &txn).await;

        info!(vip = %self.id, data = format_args!("{:#04x}", txn.data()), good_parity, "sent frame");
        Ok(txn)
    }

    fn drive_line(&self, operation: &'static str) -> Result<&L, EndpointError> {
        match &self.drive {
            Some(line) => Ok(line),
            None => {
                warn!(vip = %self.id, role = %self.config.role, operation, "role error: endpoint cannot drive");
                Err(EndpointError::Role { id: self.id, role: self.config.role, operation })
            },
        }
    }

    async fn idle_delay(&self) {
        let bit_period_ns = u64::try_from(self.bit_period().as_nanos()).unwrap_or(u64::MAX);
        let idle = self.env.random_range(0, bit_period_ns);
        self.env.sleep(Duration::from_nanos(idle)).await;
    }

    async fn drive_frame(&self, line: &L, txn: &Transaction) {
        let bit_period = self.bit_period();
        for (slot, level) in encode_transaction(txn).into_iter().enumerate() {
            line.drive(level);
            debug!(vip = %self.id, slot, level, "driving slot");
            self.env.sleep(bit_period).await;
        }
    }

    /// Wait for the next frame on the observed line and decode it.
    ///
    /// Blocks until a falling edge, samples the start slot at its center and
    /// every later slot at a random offset, then returns the transaction
    /// stamped with the time the stop slot ended. A low stop bit or a wrong
    /// parity bit is logged and left visible on the transaction; it is not
    /// an error.
    ///
    /// A call made while the line is already low waits for the next falling
    /// edge, so a line stuck low blocks until it recovers.
    ///
    /// # Errors
    ///
    /// - `EndpointError::NotBound` if no observe pin was bound
    pub async fn receive(&self) -> Result<Transaction, EndpointError> {
        let Some(sampler) = &self.observe else {
            return Err(EndpointError::NotBound { id: self.id, direction: Direction::Observe });
        };

        let mut assembler = FrameAssembler::new(self.format);
        sampler.line().falling_edge().await;
        assembler.start()?;
        debug!(vip = %self.id, at_ns = self.env.now().as_nanos() as u64, "start edge");

        while let Some(mode) = assembler.next_mode() {
            let level = sampler.sample(mode).await;
            assembler.push(level)?;
        }

        let txn = assembler.finish(self.env.now())?;
        match txn.status() {
            FrameStatus::Valid => {},
            FrameStatus::FramingError => {
                warn!(vip = %self.id, start_ok = txn.start_bit_ok(), stop_ok = txn.stop_bit_ok(), "framing error");
            },
            FrameStatus::ParityError => {
                warn!(vip = %self.id, data = format_args!("{:#04x}", txn.data()), "parity error");
            },
        }
        info!(vip = %self.id, data = format_args!("{:#04x}", txn.data()), "received frame");

        Ok(txn)
    }
}

fn resolve<R: LineResolver>(resolver: &R, path: &str) -> Result<R::Line, BindError> {
    if path.trim().is_empty() {
        return Err(BindError::EmptyPinName);
    }
    resolver.resolve(path)
}
