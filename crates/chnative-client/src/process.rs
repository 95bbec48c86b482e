//! Response stream dispatch.
//!
//! Both entry points read one packet tag per iteration and poll the query
//! context only between packets. A payload that has started decoding is
//! always decoded to the end (or to an I/O failure) before cancellation is
//! looked at again, so a very large block delays cancellation by however
//! long it takes to read.

use chnative_protocol::{
    Block, ProfileEvent, ProfileInfo, Progress, ServerException, ServerLog, ServerPacket,
    TableColumns,
};
use tokio::io::{AsyncRead, AsyncWrite};

use crate::callbacks::OnProcess;
use crate::cancel::QueryContext;
use crate::connection::Connection;
use crate::error::{Error, Result};

impl<T> Connection<T>
where
    T: AsyncRead + AsyncWrite,
{
    /// Read packets until the first data block and return it.
    ///
    /// Non-data packets seen on the way are handled as by
    /// [`drain`](Self::drain). Returns `Ok(None)` if the server ended the
    /// stream without sending any data. The returned block may have zero
    /// rows: the first block of a `SELECT` is usually a header that only
    /// carries the schema.
    ///
    /// The exclusive borrow guarantees no other reader exists, so tags are
    /// read without taking the read lock.
    pub async fn first_block(
        &mut self,
        ctx: &QueryContext,
        on: &mut OnProcess<'_>,
    ) -> Result<Option<Block>> {
        const OP: &str = "first block";
        self.ensure_open()?;
        loop {
            if let Some(reason) = ctx.check() {
                return Err(self.cancel_with(reason).await);
            }

            let revision = self.revision();
            let reader = self.reader.get_mut();
            let tag = reader.read_tag().await?;
            match ServerPacket::from_u8(tag) {
                Some(ServerPacket::Data) => {
                    let block = reader.decode(|src| Block::decode(src, revision)).await?;
                    tracing::trace!(conn_id = self.id(), rows = block.rows(), "[first block]");
                    return Ok(Some(block));
                }
                Some(ServerPacket::EndOfStream) => {
                    tracing::debug!(conn_id = self.id(), "[end of stream]");
                    return Ok(None);
                }
                _ => self.handle(OP, tag, on).await?,
            }
        }
    }

    /// Read and dispatch packets until end of stream.
    ///
    /// Every block with at least one row goes to the `data` callback. This
    /// is the only entry point that may run while other tasks share the
    /// connection; the read lock is taken for every tag and held for the
    /// full handling of its packet.
    pub async fn drain(&self, ctx: &QueryContext, on: &mut OnProcess<'_>) -> Result<()> {
        const OP: &str = "drain";
        self.ensure_open()?;
        loop {
            if let Some(reason) = ctx.check() {
                return Err(self.cancel_with(reason).await);
            }

            let tag = self.read_tag_locked().await?;
            if tag == ServerPacket::EndOfStream as u8 {
                tracing::debug!(conn_id = self.id(), "[end of stream]");
                return Ok(());
            }
            self.handle(OP, tag, on).await?;
        }
    }

    async fn read_tag_locked(&self) -> Result<u8> {
        let mut reader = self.reader.lock().await;
        tokio::select! {
            biased;
            () = self.closed.cancelled() => Err(Error::ConnectionClosed),
            tag = reader.read_tag() => Ok(tag?),
        }
    }

    /// Decode one packet and route it, holding the read lock throughout.
    async fn handle(&self, op: &'static str, tag: u8, on: &mut OnProcess<'_>) -> Result<()> {
        let mut reader = self.reader.lock().await;
        let revision = self.revision();
        let conn_id = self.id();

        let Some(packet) = ServerPacket::from_u8(tag) else {
            return Err(Error::UnexpectedPacket { op, packet: tag });
        };
        tracing::trace!(conn_id, packet = packet.name(), "handling packet");

        match packet {
            ServerPacket::Data | ServerPacket::Totals | ServerPacket::Extremes => {
                let block = reader.decode(|src| Block::decode(src, revision)).await?;
                if block.rows() != 0 {
                    on.data(block);
                }
            }
            ServerPacket::Exception => {
                let exception = reader.decode(|src| ServerException::decode(src)).await?;
                tracing::debug!(conn_id, code = exception.code, "[exception] {exception}");
                return Err(Error::Server(exception));
            }
            ServerPacket::ProfileInfo => {
                let info = reader.decode(|src| ProfileInfo::decode(src, revision)).await?;
                tracing::debug!(conn_id, "[profile info] {info}");
                on.profile_info(info);
            }
            ServerPacket::TableColumns => {
                reader.decode(|src| TableColumns::decode(src)).await?;
                tracing::debug!(conn_id, "[table columns]");
            }
            ServerPacket::ProfileEvents => {
                let block = reader.decode(|src| Block::decode(src, revision)).await?;
                on.profile_events(ProfileEvent::from_block(&block)?);
            }
            ServerPacket::Log => {
                let block = reader.decode(|src| Block::decode(src, revision)).await?;
                on.logs(ServerLog::from_block(&block)?);
            }
            ServerPacket::Progress => {
                let progress = reader.decode(|src| Progress::decode(src, revision)).await?;
                tracing::debug!(conn_id, "[progress] {progress}");
                on.progress(progress);
            }
            ServerPacket::EndOfStream => {
                return Err(Error::UnexpectedPacket { op, packet: tag });
            }
        }
        Ok(())
    }
}
