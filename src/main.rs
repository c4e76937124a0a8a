use bucketstat::error::AppResult;

fn main() -> AppResult<()> {
    bucketstat::entry::run()
}
