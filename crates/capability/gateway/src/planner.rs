//! 批量读取规划：同一端点上连续的 R 编号合并为一次功能码 03 请求。

use domain::{DeviceEndpoint, WindowKind};
use plcgw_normalize::{AddressTranslator, NormalizeError};
use std::collections::{BTreeMap, BTreeSet};

/// 一次线路读取请求。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReadRequest {
    pub endpoint: DeviceEndpoint,
    pub start_r: u32,
    pub offset: u16,
    pub count: u16,
}

impl ReadRequest {
    /// 请求覆盖的 R 编号（按顺序）。
    pub fn r_numbers(&self) -> impl Iterator<Item = u32> + '_ {
        self.start_r..self.start_r + u32::from(self.count)
    }
}

/// 规划读取请求。重复的目标只读一次，每个请求不超过 `max_count` 个寄存器。
pub fn plan_reads(
    targets: impl IntoIterator<Item = (DeviceEndpoint, u32)>,
    translator: &AddressTranslator,
    max_count: u16,
) -> Result<Vec<ReadRequest>, NormalizeError> {
    let mut grouped: BTreeMap<String, (DeviceEndpoint, BTreeSet<u32>)> = BTreeMap::new();
    for (endpoint, r_number) in targets {
        grouped
            .entry(endpoint.to_string())
            .or_insert_with(|| (endpoint.clone(), BTreeSet::new()))
            .1
            .insert(r_number);
    }

    let max_count = max_count.max(1);
    let mut requests = Vec::new();
    for (endpoint, r_numbers) in grouped.into_values() {
        let mut current: Option<ReadRequest> = None;
        for r_number in r_numbers {
            let offset = translator.translate(r_number, WindowKind::Read)?;
            if let Some(request) = current.as_mut() {
                let adjacent = r_number == request.start_r + u32::from(request.count);
                if adjacent && request.count < max_count {
                    request.count += 1;
                    continue;
                }
            }
            if let Some(done) = current.take() {
                requests.push(done);
            }
            current = Some(ReadRequest {
                endpoint: endpoint.clone(),
                start_r: r_number,
                offset,
                count: 1,
            });
        }
        requests.extend(current);
    }
    Ok(requests)
}
