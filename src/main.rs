fn main() -> anyhow::Result<()> {
    deskwatch_lib::run()
}
