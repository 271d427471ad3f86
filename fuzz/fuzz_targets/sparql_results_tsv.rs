#![no_main]

use libfuzzer_sys::fuzz_target;
use svresults::QueryResultsFormat;
use svresults_fuzz::result_format::{fuzz_chunk_splits, fuzz_result_format};

fuzz_target!(|data: &[u8]| {
    fuzz_chunk_splits(QueryResultsFormat::Tsv, data);
    fuzz_result_format(QueryResultsFormat::Tsv, data);
});
